//! Keyboard-event encoding: a viewer-local key press becomes the `Keys`
//! string and `IsShortcut` flag the server expects.

use arcane_core::outbound_event_name;
use arcane_core::OutboundEvent;

/// A named (non-printable) key, independent of any modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Backspace,
    Tab,
    Escape,
    CapsLock,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Help,
    Print,
    ScrollLock,
}

impl NamedKey {
    fn token(self) -> &'static str {
        match self {
            Self::Up => "{UP}",
            Self::Down => "{DOWN}",
            Self::Left => "{LEFT}",
            Self::Right => "{RIGHT}",
            Self::Enter => "{ENTER}",
            Self::Backspace => "{BACKSPACE}",
            Self::Tab => "{TAB}",
            Self::Escape => "{ESC}",
            Self::CapsLock => "{CAPSLOCK}",
            Self::Delete => "{DEL}",
            Self::Home => "{HOME}",
            Self::End => "{END}",
            Self::PageUp => "{PGUP}",
            Self::PageDown => "{PGDN}",
            Self::Insert => "{INS}",
            Self::Help => "{HELP}",
            Self::Print => "{PRTSC}",
            Self::ScrollLock => "{SCROLLLOCK}",
        }
    }
}

/// A viewer-local key event, already classified by the host's input
/// layer into one of the shapes the wire encoding distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyEvent {
    /// F1..=F16, with whether Alt was held alongside it.
    Function { number: u8, alt: bool },
    /// Ctrl held down with an ASCII letter.
    CtrlLetter(char),
    Named(NamedKey),
    /// The Windows key alone.
    MetaAlone,
    /// Windows+L (lock workstation).
    MetaL,
    /// A bare modifier press (Ctrl/Alt/Shift with no other key) — these
    /// arrive as part of a shortcut's other branches and are otherwise
    /// meaningless on their own.
    ModifierAlone,
    /// Raw typed text (printable characters, IME input, paste-as-keys).
    Text(String),
}

const ESCAPED_CHARS: [char; 6] = ['{', '+', '}', '%', '(', ')'];

/// Escapes characters the wire format treats specially by wrapping each
/// one in braces (`+` → `{+}`), except a literal `{` which doubles
/// itself (`{` → `{{`) rather than becoming `{{}`.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '{' {
            out.push_str("{{");
        } else if ESCAPED_CHARS.contains(&ch) {
            out.push('{');
            out.push(ch);
            out.push('}');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Encodes a key event into `(Keys, IsShortcut)`, or `None` if the event
/// is suppressed (a bare modifier press).
pub fn encode(event: &KeyEvent) -> Option<(String, bool)> {
    match event {
        KeyEvent::Function { number, alt } => {
            let base = format!("{{F{number}}}");
            if *alt {
                Some((format!("{{%}}{base}"), true))
            } else {
                Some((base, false))
            }
        }
        KeyEvent::CtrlLetter(letter) => Some((format!("{{^}}{}", letter.to_ascii_uppercase()), true)),
        KeyEvent::Named(named) => Some((named.token().to_owned(), false)),
        KeyEvent::MetaAlone => Some(("{!}".to_owned(), false)),
        KeyEvent::MetaL => Some(("{LOCKWORKSTATION}".to_owned(), true)),
        KeyEvent::ModifierAlone => None,
        KeyEvent::Text(text) => Some((escape_text(text), false)),
    }
}

/// Encodes a key event directly into the outbound wire event, for
/// callers that don't need the raw `(Keys, IsShortcut)` pair.
pub fn encode_to_event(event: &KeyEvent) -> Option<OutboundEvent> {
    encode(event).map(|(keys, is_shortcut)| OutboundEvent::Keyboard { keys, is_shortcut })
}

/// The wire name used for every keyboard event regardless of encoding.
pub const WIRE_NAME: &str = outbound_event_name::KEYBOARD;
