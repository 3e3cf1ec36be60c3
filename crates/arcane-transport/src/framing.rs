//! Text and binary framing over an established TLS stream.
//!
//! Text frames are UTF-8 terminated by `\n`; the trailing CR/LF is
//! stripped on read and appended on write. Binary frames (desktop only)
//! are a fixed 13-byte little-endian header followed by `chunk_size`
//! bytes of opaque image data. The two framings interleave on the
//! desktop connection, so readers must never consume past a frame's own
//! boundary.

use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// The outcome of a framed text read that keeps end-of-stream and I/O
/// errors distinguishable from a line that was actually received (even
/// an empty one, e.g. a lone `\n`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineFrame {
    Line(String),
    /// End-of-stream or a read error before a single byte of a new line
    /// arrived — the connection is dead, not just carrying a blank line.
    Closed,
}

/// Reads one text frame, distinguishing a received (possibly empty) line
/// from end-of-stream/error. Long-running reader loops (`EventStream`'s
/// reader half) use this to tell "recoverable hiccup, keep looping" apart
/// from "the peer is gone, stop looping" — see `read_line` for the
/// simpler, EOF-folds-into-empty-string variant used by one-shot reads.
pub fn read_line_framed<R: Read>(reader: &mut R) -> LineFrame {
    let mut data = Vec::new();
    let mut byte = [0u8; 1];
    let mut saw_any_byte = false;

    loop {
        match reader.read(&mut byte) {
            Ok(0) | Err(_) if !saw_any_byte => return LineFrame::Closed,
            Ok(0) | Err(_) => break,
            Ok(_) => {
                saw_any_byte = true;
                if byte[0] == b'\n' {
                    break;
                }
                data.push(byte[0]);
            }
        }
    }

    LineFrame::Line(String::from_utf8_lossy(&data).trim_end_matches('\r').to_string())
}

/// Reads one text frame. Tolerant by design: an I/O error or end-of-stream
/// mid-line yields whatever bytes were read so far (typically empty),
/// never an `Err` — callers that need to tell a dead connection apart
/// from a merely blank/malformed line (e.g. `EventStream`'s reader loop)
/// should use `read_line_framed` instead.
pub fn read_line<R: Read>(reader: &mut R) -> String {
    match read_line_framed(reader) {
        LineFrame::Line(line) => line,
        LineFrame::Closed => String::new(),
    }
}

/// Writes one text frame, appending `\r\n`.
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\r\n")?;
    writer.flush()
}

/// Reads one text frame and decodes it as JSON. Returns `None` on an
/// empty line or a parse failure rather than propagating an error —
/// parse hiccups are recoverable per the framing contract.
pub fn read_json<T: DeserializeOwned, R: Read>(reader: &mut R) -> Option<T> {
    let line = read_line(reader);
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(&line).ok()
}

/// The outcome of a framed JSON read for long-running reader loops: a
/// decoded value, a recoverable hiccup (blank line or bad JSON), or a
/// dead connection.
pub enum JsonFrame<T> {
    Value(T),
    Malformed,
    Closed,
}

/// `read_json`'s EOF-aware counterpart. A blank line or JSON parse
/// failure is `Malformed` (recoverable — the caller should `continue`);
/// end-of-stream or a read error is `Closed` (the caller should stop).
pub fn read_json_framed<T: DeserializeOwned, R: Read>(reader: &mut R) -> JsonFrame<T> {
    match read_line_framed(reader) {
        LineFrame::Closed => JsonFrame::Closed,
        LineFrame::Line(line) => {
            if line.is_empty() {
                return JsonFrame::Malformed;
            }
            match serde_json::from_str(&line) {
                Ok(value) => JsonFrame::Value(value),
                Err(_) => JsonFrame::Malformed,
            }
        }
    }
}

/// Serializes `value` as a single JSON line and writes it as a text
/// frame.
pub fn write_json<T: Serialize, W: Write>(writer: &mut W, value: &T) -> io::Result<()> {
    let line = serde_json::to_string(value).map_err(io::Error::other)?;
    write_line(writer, &line)
}

/// The 13-byte desktop-frame header: `(chunk_size, x, y, screen_updated)`,
/// little-endian. When `screen_updated` is set, no image payload
/// follows — a single Screen JSON text frame follows the header instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub chunk_size: u32,
    pub x: u32,
    pub y: u32,
    pub screen_updated: bool,
}

pub const FRAME_HEADER_LEN: usize = 13;

impl FrameHeader {
    pub fn to_bytes(self) -> [u8; FRAME_HEADER_LEN] {
        let mut buf = [0u8; FRAME_HEADER_LEN];
        buf[0..4].copy_from_slice(&self.chunk_size.to_le_bytes());
        buf[4..8].copy_from_slice(&self.x.to_le_bytes());
        buf[8..12].copy_from_slice(&self.y.to_le_bytes());
        buf[12] = u8::from(self.screen_updated);
        buf
    }

    pub fn from_bytes(buf: &[u8; FRAME_HEADER_LEN]) -> Self {
        Self {
            chunk_size: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            x: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            y: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            screen_updated: buf[12] != 0,
        }
    }
}

/// Reads one 13-byte frame header. Returns `Ok(None)` on a clean
/// end-of-stream before any byte of the header arrived; a short read
/// that starts but doesn't complete the header is an `UnexpectedEof`
/// error, since the stream is then in an unrecoverable, desynchronized
/// state.
pub fn read_frame_header<R: Read>(reader: &mut R) -> io::Result<Option<FrameHeader>> {
    let mut buf = [0u8; FRAME_HEADER_LEN];
    let mut read = 0;

    while read < FRAME_HEADER_LEN {
        match reader.read(&mut buf[read..])? {
            0 if read == 0 => return Ok(None),
            0 => return Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            n => read += n,
        }
    }

    Ok(Some(FrameHeader::from_bytes(&buf)))
}

pub fn write_frame_header<W: Write>(writer: &mut W, header: FrameHeader) -> io::Result<()> {
    writer.write_all(&header.to_bytes())
}

/// Reads exactly `chunk_size` bytes, tolerating short reads by looping;
/// each individual recv is bounded by `packet_size` (mirrors the
/// server's own packetization so reads line up with TCP segments). A
/// zero-byte read before `chunk_size` bytes have arrived is a premature
/// EOF.
pub fn read_chunk<R: Read>(reader: &mut R, chunk_size: u32, packet_size: u32) -> io::Result<Vec<u8>> {
    let chunk_size = chunk_size as usize;
    let packet_size = (packet_size as usize).max(1);
    let mut data = vec![0u8; chunk_size];
    let mut read = 0;

    while read < chunk_size {
        let want = packet_size.min(chunk_size - read);
        let n = reader.read(&mut data[read..read + want])?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        read += n;
    }

    Ok(data)
}
