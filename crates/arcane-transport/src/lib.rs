pub mod auth;
pub mod framing;
pub mod transport;

pub use auth::{authenticate, solve_challenge};
pub use framing::{
    read_chunk, read_frame_header, read_json, read_json_framed, read_line, read_line_framed, write_frame_header,
    write_json, write_line, FrameHeader, JsonFrame, LineFrame, FRAME_HEADER_LEN,
};
pub use transport::Connection;
