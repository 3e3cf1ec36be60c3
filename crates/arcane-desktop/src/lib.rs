//! The desktop worker: negotiates which screen to mirror, then streams
//! dirty-rect image tiles for as long as the connection stays open.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use tracing::{debug, info, warn};

use arcane_core::{DesktopSignal, Renderer, Screen, ScreenList, ScreenSelector};
use arcane_transport::{read_chunk, read_frame_header, read_json, write_json, Connection};

#[derive(Debug, serde::Serialize)]
struct DesktopHandshakeRequest<'a> {
    #[serde(rename = "ScreenName")]
    screen_name: &'a str,
    #[serde(rename = "ImageCompressionQuality")]
    image_compression_quality: u8,
    #[serde(rename = "PacketSize")]
    packet_size: u32,
    #[serde(rename = "BlockSize")]
    block_size: u32,
}

pub struct DesktopStream {
    connection: Connection,
    image_quality: u8,
    packet_size: u32,
    block_size: u32,
    screen_selector: Arc<dyn ScreenSelector>,
    renderer: Arc<dyn Renderer>,
    signals: mpsc::SyncSender<DesktopSignal>,
    cancel: Arc<AtomicBool>,
}

impl DesktopStream {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connection: Connection,
        image_quality: u8,
        packet_size: u32,
        block_size: u32,
        screen_selector: Arc<dyn ScreenSelector>,
        renderer: Arc<dyn Renderer>,
        signals: mpsc::SyncSender<DesktopSignal>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            connection,
            image_quality,
            packet_size,
            block_size,
            screen_selector,
            renderer,
            signals,
            cancel,
        }
    }

    /// Runs the handshake then the streaming loop to completion. Always
    /// closes its connection before returning, whether it ends cleanly
    /// (the user rejected screen selection, or was stopped) or on error.
    pub fn run(mut self) {
        let error = match self.handshake() {
            Ok(true) => self.stream_loop(),
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, "desktop handshake failed");
                true
            }
        };

        self.connection.close();
        let _ = self.signals.send(DesktopSignal::Finished { error });
    }

    /// Reads the screen list, resolves a selection, and writes the
    /// viewer's chosen tuning. Returns `Ok(false)` if the user rejected
    /// selection (not an error — the stream should end quietly).
    fn handshake(&mut self) -> Result<bool, std::io::Error> {
        let list: ScreenList = read_json(&mut (&self.connection))
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "malformed screen list"))?;

        let screen = resolve_screen(&list.list, self.screen_selector.as_ref());

        let Some(screen) = screen else {
            info!("user declined screen selection");
            return Ok(false);
        };

        write_json(
            &mut (&self.connection),
            &DesktopHandshakeRequest {
                screen_name: &screen.name,
                image_compression_quality: self.image_quality,
                packet_size: self.packet_size,
                block_size: self.block_size,
            },
        )?;

        self.renderer.resize_viewport(&screen);
        let _ = self.signals.send(DesktopSignal::ScreenSelected(screen));
        let _ = self.signals.send(DesktopSignal::StartEventsWorker);

        Ok(true)
    }

    /// Reads frames until a cooperative stop, a zero-byte read, or an
    /// I/O error. Returns whether the loop ended in error.
    fn stream_loop(&mut self) -> bool {
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return false;
            }

            let header = match read_frame_header(&mut (&self.connection)) {
                Ok(Some(header)) => header,
                Ok(None) => return false,
                Err(e) => {
                    debug!(error = %e, "desktop frame header read failed");
                    return true;
                }
            };

            if header.screen_updated {
                let screen: Option<Screen> = read_json(&mut (&self.connection));
                let Some(screen) = screen else { return true };
                self.renderer.resize_viewport(&screen);
                let _ = self.signals.send(DesktopSignal::ScreenSelected(screen));
                continue;
            }

            let image = match read_chunk(&mut (&self.connection), header.chunk_size, self.packet_size) {
                Ok(image) => image,
                Err(e) => {
                    debug!(error = %e, "desktop chunk read failed");
                    return true;
                }
            };

            self.renderer.paint(&image, header.x, header.y);
        }
    }
}

/// Auto-selects a lone screen without bothering the host's selector;
/// defers to it whenever there's more than one candidate.
fn resolve_screen(screens: &[Screen], selector: &dyn ScreenSelector) -> Option<Screen> {
    match screens {
        [only] => Some(only.clone()),
        _ => selector.select(screens),
    }
}
