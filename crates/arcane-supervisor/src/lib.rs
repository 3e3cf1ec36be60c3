//! Owns the desktop and events workers end-to-end: attaches both
//! connections, starts events once desktop's handshake completes, and
//! tears both down the moment either one finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{error, info, warn};

use arcane_core::{ClipboardBridge, DesktopSignal, EventsSignal, InputSource, Renderer, ScreenSelector, Session, WorkerKind};
use arcane_desktop::DesktopStream;
use arcane_events::{EventReader, EventWriter};
use arcane_session::attach;
use arcane_transport::Connection;

/// Lifecycle state for a worker: `Idle → Running → Stopping →
/// Stopped(ok|error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Stopping,
    Stopped { error: bool },
}

enum WorkerSignal {
    Desktop(DesktopSignal),
    Events(EventsSignal),
}

pub struct SupervisorCapabilities {
    pub screen_selector: Arc<dyn ScreenSelector>,
    pub renderer: Arc<dyn Renderer>,
    pub clipboard: Arc<dyn ClipboardBridge>,
    pub input: Arc<dyn InputSource>,
}

pub struct Supervisor {
    host: String,
    port: u16,
    password: String,
    session: Session,
    capabilities: SupervisorCapabilities,
    state: Mutex<SupervisorState>,
    desktop_cancel: Arc<AtomicBool>,
    events_cancel: Arc<AtomicBool>,
    desktop_connection: Mutex<Option<Connection>>,
    events_connection: Mutex<Option<Connection>>,
}

impl Supervisor {
    pub fn new(host: String, port: u16, password: String, session: Session, capabilities: SupervisorCapabilities) -> Self {
        Self {
            host,
            port,
            password,
            session,
            capabilities,
            state: Mutex::new(SupervisorState::Idle),
            desktop_cancel: Arc::new(AtomicBool::new(false)),
            events_cancel: Arc::new(AtomicBool::new(false)),
            desktop_connection: Mutex::new(None),
            events_connection: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap()
    }

    /// Attaches the desktop worker, then blocks the calling thread until
    /// both workers have finished (naturally, or via `close()` from
    /// another thread). Returns whether the session ended in error.
    pub fn run(&self) -> Result<bool, arcane_core::ArcaneError> {
        *self.state.lock().unwrap() = SupervisorState::Running;

        let desktop_connection = attach(&self.host, self.port, &self.password, &self.session, WorkerKind::Desktop)?;
        *self.desktop_connection.lock().unwrap() = Some(desktop_connection.clone());

        let (combined_tx, combined_rx) = mpsc::sync_channel::<WorkerSignal>(32);

        let (desktop_tx, desktop_rx) = mpsc::sync_channel::<DesktopSignal>(8);
        spawn_forwarder(desktop_rx, combined_tx.clone(), WorkerSignal::Desktop);

        let desktop_stream = DesktopStream::new(
            desktop_connection,
            self.session.image_quality,
            self.session.packet_size,
            self.session.block_size,
            self.capabilities.screen_selector.clone(),
            self.capabilities.renderer.clone(),
            desktop_tx,
            self.desktop_cancel.clone(),
        );
        let desktop_handle = std::thread::spawn(move || desktop_stream.run());

        let mut events_handles: Option<(JoinHandle<()>, JoinHandle<()>)> = None;
        let mut desktop_error = false;
        let mut events_error = false;
        let mut desktop_done = false;
        let mut events_done = false;

        for signal in combined_rx.iter() {
            match signal {
                WorkerSignal::Desktop(DesktopSignal::ScreenSelected(screen)) => {
                    info!(screen = %screen.name, "active screen selected");
                }
                WorkerSignal::Desktop(DesktopSignal::StartEventsWorker) => {
                    if events_handles.is_none() {
                        match attach(&self.host, self.port, &self.password, &self.session, WorkerKind::Events) {
                            Ok(events_connection) => {
                                *self.events_connection.lock().unwrap() = Some(events_connection.clone());

                                let (events_tx, events_rx) = mpsc::sync_channel::<EventsSignal>(8);
                                spawn_forwarder(events_rx, combined_tx.clone(), WorkerSignal::Events);

                                let reader = EventReader::new(
                                    events_connection.clone(),
                                    self.capabilities.renderer.clone(),
                                    self.capabilities.clipboard.clone(),
                                    self.session.effective_clipboard_mode,
                                    self.events_cancel.clone(),
                                    events_tx,
                                );
                                let reader_handle = std::thread::spawn(move || reader.run());

                                let writer = EventWriter::new(
                                    events_connection,
                                    self.capabilities.input.clone(),
                                    self.session.effective_clipboard_mode,
                                    self.session.view_only,
                                    self.events_cancel.clone(),
                                );
                                let writer_handle = std::thread::spawn(move || writer.run());

                                events_handles = Some((reader_handle, writer_handle));
                            }
                            Err(e) => {
                                warn!(error = %e, "failed to attach events worker");
                                self.stop_desktop();
                                events_error = true;
                                events_done = true;
                            }
                        }
                    }
                }
                WorkerSignal::Desktop(DesktopSignal::Finished { error }) => {
                    desktop_done = true;
                    desktop_error = error;
                    *self.state.lock().unwrap() = SupervisorState::Stopping;
                    self.stop_events();
                }
                WorkerSignal::Events(EventsSignal::Finished { error }) => {
                    events_done = true;
                    events_error = error;
                    *self.state.lock().unwrap() = SupervisorState::Stopping;
                    self.stop_desktop();
                }
            }

            if both_workers_settled(desktop_done, events_done, events_handles.is_some()) {
                break;
            }
        }

        let _ = desktop_handle.join();
        if let Some((reader_handle, writer_handle)) = events_handles {
            let _ = reader_handle.join();
            self.events_cancel.store(true, Ordering::SeqCst);
            if let Some(conn) = self.events_connection.lock().unwrap().as_ref() {
                conn.close();
            }
            let _ = writer_handle.join();
        }

        let error = desktop_error || events_error;
        if error {
            error!("session ended with an error");
        }
        *self.state.lock().unwrap() = SupervisorState::Stopped { error };

        Ok(error)
    }

    fn stop_desktop(&self) {
        self.desktop_cancel.store(true, Ordering::SeqCst);
        if let Some(conn) = self.desktop_connection.lock().unwrap().as_ref() {
            conn.close();
        }
    }

    fn stop_events(&self) {
        self.events_cancel.store(true, Ordering::SeqCst);
        if let Some(conn) = self.events_connection.lock().unwrap().as_ref() {
            conn.close();
        }
    }

    /// Requests that both workers stop. Safe to call from any thread,
    /// including one other than the thread blocked in `run()`.
    pub fn close(&self) {
        self.stop_desktop();
        self.stop_events();
    }
}

fn spawn_forwarder<T: Send + 'static>(
    rx: mpsc::Receiver<T>,
    tx: mpsc::SyncSender<WorkerSignal>,
    wrap: fn(T) -> WorkerSignal,
) {
    std::thread::spawn(move || {
        for item in rx.iter() {
            if tx.send(wrap(item)).is_err() {
                break;
            }
        }
    });
}

/// The coordinator loop's exit condition: desktop must be done, and
/// events must either never have started or also be done — an events
/// worker that was never attached (desktop rejected screen selection,
/// or attach itself failed) doesn't block shutdown.
fn both_workers_settled(desktop_done: bool, events_done: bool, events_started: bool) -> bool {
    desktop_done && (events_done || !events_started)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_alone_unblocks_shutdown_when_events_never_started() {
        assert!(both_workers_settled(true, false, false));
    }

    #[test]
    fn desktop_done_waits_for_events_once_events_has_started() {
        assert!(!both_workers_settled(true, false, true));
        assert!(both_workers_settled(true, true, true));
    }

    #[test]
    fn events_done_alone_does_not_unblock_shutdown() {
        assert!(!both_workers_settled(false, true, true));
    }

    #[test]
    fn fresh_supervisor_state_is_idle() {
        let session = Session::new(
            "sid".into(),
            "FP".into(),
            "u@m".into(),
            "10".into(),
            false,
            arcane_core::ClipboardMode::Disabled,
            80,
            4096,
            64,
        );
        let supervisor = Supervisor::new(
            "host".into(),
            5900,
            "pw".into(),
            session,
            SupervisorCapabilities {
                screen_selector: Arc::new(NoopSelector),
                renderer: Arc::new(NoopRenderer),
                clipboard: Arc::new(NoopClipboard),
                input: Arc::new(NoopInput),
            },
        );
        assert_eq!(supervisor.state(), SupervisorState::Idle);
    }

    struct NoopSelector;
    impl ScreenSelector for NoopSelector {
        fn select(&self, _screens: &[arcane_core::Screen]) -> Option<arcane_core::Screen> {
            None
        }
    }

    struct NoopRenderer;
    impl Renderer for NoopRenderer {
        fn paint(&self, _image: &[u8], _x: u32, _y: u32) {}
        fn resize_viewport(&self, _screen: &arcane_core::Screen) {}
        fn set_cursor(&self, _cursor: arcane_core::CursorKind) {}
    }

    struct NoopClipboard;
    impl ClipboardBridge for NoopClipboard {
        fn set_text(&self, _text: &str) {}
    }

    struct NoopInput;
    impl InputSource for NoopInput {
        fn poll(&self) -> Option<arcane_core::OutboundEvent> {
            None
        }
    }
}
