pub mod capability;
pub mod config;
pub mod error;
pub mod events;
pub mod protocol;
pub mod screen;
pub mod session;
pub mod signal;

pub use capability::{ClipboardBridge, InputSource, Renderer, ScreenSelector, TrustStore};
pub use config::Defaults;
pub use error::ArcaneError;
pub use events::{InboundEvent, OutboundEvent};
pub use protocol::{
    inbound_event_id, outbound_event_name, ClipboardMode, CursorKind, MouseButton, MouseState, ProtocolCommand,
    WorkerKind, PROTOCOL_VERSION,
};
pub use screen::{DirtyRect, Screen, ScreenList};
pub use session::{reconcile_clipboard, Session, BLOCK_SIZES, IMAGE_QUALITY_RANGE, PACKET_SIZES};
pub use signal::{DesktopSignal, EventsSignal};
