//! `multipart/x-mixed-replace` part encoding
//!
//! Each part on the wire:
//!
//! ```text
//! \r\n--<boundary>\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <n>\r\n
//! \r\n
//! <n frame bytes>
//! ```

use bytes::{BufMut, Bytes, BytesMut};

/// Encode one frame as a multipart part
pub fn encode_part(boundary: &str, content_type: &str, frame: &[u8]) -> Bytes {
    let length = frame.len().to_string();
    let header_len = 2 + 2 + boundary.len() + 2
        + "Content-Type: ".len() + content_type.len() + 2
        + "Content-Length: ".len() + length.len() + 4;

    let mut buf = BytesMut::with_capacity(header_len + frame.len());
    buf.put_slice(b"\r\n--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"\r\n");
    buf.put_slice(b"Content-Type: ");
    buf.put_slice(content_type.as_bytes());
    buf.put_slice(b"\r\n");
    buf.put_slice(b"Content-Length: ");
    buf.put_slice(length.as_bytes());
    buf.put_slice(b"\r\n\r\n");
    buf.put_slice(frame);
    buf.freeze()
}
