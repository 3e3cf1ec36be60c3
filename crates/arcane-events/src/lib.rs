pub mod keyboard;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use arcane_core::{
    inbound_event_id, outbound_event_name, ClipboardBridge, ClipboardMode, CursorKind, EventsSignal, InboundEvent,
    InputSource, OutboundEvent, Renderer,
};
use arcane_transport::{read_json_framed, write_json, Connection, JsonFrame};

#[derive(Debug, Deserialize)]
struct InboundWire {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Cursor")]
    cursor: Option<String>,
    #[serde(rename = "Text")]
    text: Option<String>,
}

fn classify_inbound(wire: InboundWire) -> Option<InboundEvent> {
    match wire.id {
        inbound_event_id::MOUSE_CURSOR_UPDATED => {
            wire.cursor.map(|name| InboundEvent::CursorShape(CursorKind::from_remote_name(&name)))
        }
        inbound_event_id::CLIPBOARD_UPDATED => wire.text.map(InboundEvent::ClipboardText),
        _ => None,
    }
}

/// The reader half: runs on the worker's own thread, dispatching
/// `CursorShape` to the renderer and `ClipboardText` to the clipboard
/// bridge (subject to `effective_clipboard_mode`).
pub struct EventReader {
    connection: Connection,
    renderer: Arc<dyn Renderer>,
    clipboard: Arc<dyn ClipboardBridge>,
    effective_clipboard_mode: ClipboardMode,
    cancel: Arc<AtomicBool>,
    signals: mpsc::SyncSender<EventsSignal>,
}

impl EventReader {
    pub fn new(
        connection: Connection,
        renderer: Arc<dyn Renderer>,
        clipboard: Arc<dyn ClipboardBridge>,
        effective_clipboard_mode: ClipboardMode,
        cancel: Arc<AtomicBool>,
        signals: mpsc::SyncSender<EventsSignal>,
    ) -> Self {
        Self { connection, renderer, clipboard, effective_clipboard_mode, cancel, signals }
    }

    pub fn run(mut self) {
        let error = self.read_loop();
        self.connection.close();
        let _ = self.signals.send(EventsSignal::Finished { error });
    }

    fn read_loop(&mut self) -> bool {
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return false;
            }

            let wire: JsonFrame<InboundWire> = read_json_framed(&mut (&self.connection));
            let wire = match wire {
                JsonFrame::Value(wire) => wire,
                // A blank line or malformed JSON is a recoverable hiccup,
                // not end-of-stream — keep looping.
                JsonFrame::Malformed => continue,
                // The connection is actually dead: a cooperative stop
                // already closes it (caught by the cancel flag above), so
                // reaching this means the peer hung up on its own.
                JsonFrame::Closed => return !self.cancel.load(Ordering::SeqCst),
            };

            match classify_inbound(wire) {
                Some(InboundEvent::CursorShape(cursor)) => self.renderer.set_cursor(cursor),
                Some(InboundEvent::ClipboardText(text)) => {
                    if !matches!(self.effective_clipboard_mode, ClipboardMode::Disabled | ClipboardMode::Send) {
                        self.clipboard.set_text(&text);
                    }
                }
                None => debug!("ignoring inbound event with unrecognized or incomplete Id"),
            }
        }
    }
}

/// The writer half: shares the same `Connection` as the reader (the
/// underlying TLS state tolerates concurrent read/write from distinct
/// actors — see `arcane_transport::Connection`). Polls `InputSource` for
/// locally captured input and forwards it, subject to `view_only` and
/// clipboard-direction gating.
pub struct EventWriter {
    connection: Connection,
    input: Arc<dyn InputSource>,
    effective_clipboard_mode: ClipboardMode,
    view_only: bool,
    cancel: Arc<AtomicBool>,
}

#[derive(Serialize)]
struct MouseClickMoveWire<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "X")]
    x: i32,
    #[serde(rename = "Y")]
    y: i32,
    #[serde(rename = "Button")]
    button: &'a str,
    #[serde(rename = "Type")]
    state: &'a str,
}

#[derive(Serialize)]
struct MouseWheelWire<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Delta")]
    delta: i32,
}

#[derive(Serialize)]
struct KeyboardWire<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "IsShortcut")]
    is_shortcut: bool,
    #[serde(rename = "Keys")]
    keys: &'a str,
}

#[derive(Serialize)]
struct ClipboardUpdatedWire<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Text")]
    text: &'a str,
}

impl EventWriter {
    pub fn new(
        connection: Connection,
        input: Arc<dyn InputSource>,
        effective_clipboard_mode: ClipboardMode,
        view_only: bool,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self { connection, input, effective_clipboard_mode, view_only, cancel }
    }

    /// Polls `InputSource`, writing each event it produces. Intended to
    /// run on its own thread alongside `EventReader::run`. Backs off
    /// briefly when nothing is pending rather than spinning the CPU.
    pub fn run(mut self) {
        const IDLE_BACKOFF: std::time::Duration = std::time::Duration::from_millis(10);

        while !self.cancel.load(Ordering::SeqCst) {
            match self.input.poll() {
                Some(event) => {
                    if self.write(&event).is_err() {
                        return;
                    }
                }
                None => std::thread::sleep(IDLE_BACKOFF),
            }
        }
    }

    fn write(&mut self, event: &OutboundEvent) -> std::io::Result<()> {
        if self.view_only {
            return Ok(());
        }

        match event {
            OutboundEvent::MouseMoveOrClick { x, y, state, button } => write_json(
                &mut (&self.connection),
                &MouseClickMoveWire {
                    id: outbound_event_name::MOUSE_CLICK_MOVE,
                    x: *x,
                    y: *y,
                    button: button.wire_name(),
                    state: state.wire_name(),
                },
            ),
            OutboundEvent::MouseWheel { delta } => {
                write_json(&mut (&self.connection), &MouseWheelWire { id: outbound_event_name::MOUSE_WHEEL, delta: *delta })
            }
            OutboundEvent::Keyboard { keys, is_shortcut } => write_json(
                &mut (&self.connection),
                &KeyboardWire { id: outbound_event_name::KEYBOARD, is_shortcut: *is_shortcut, keys },
            ),
            OutboundEvent::ClipboardText { text } => {
                if matches!(self.effective_clipboard_mode, ClipboardMode::Send | ClipboardMode::Both) {
                    write_json(
                        &mut (&self.connection),
                        &ClipboardUpdatedWire { id: outbound_event_name::CLIPBOARD_UPDATED, text },
                    )
                } else {
                    Ok(())
                }
            }
        }
    }
}
