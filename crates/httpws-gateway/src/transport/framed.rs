//! Frame-level I/O on top of the link halves.

use httpws_core::error::Result;
use httpws_core::protocol::frame::{encode_frame, Frame, FrameHeader, HEADER_LEN};

use crate::transport::buffered::BufferedReader;
use crate::transport::link::{LinkRead, LinkWrite};

/// Read one complete frame.
///
/// The header is validated before the body is requested, so a hostile length
/// field never causes a body-sized read or allocation.
pub async fn read_frame<R: LinkRead>(reader: &mut BufferedReader<R>) -> Result<Frame> {
    let head = reader.read_exact(HEADER_LEN).await?;
    let header = FrameHeader::parse(&head)?;
    let body = reader.read_exact(header.body_len()).await?;
    Ok(Frame { header, body })
}

/// Write header + body as one link message.
pub async fn write_frame<W: LinkWrite + ?Sized>(writer: &mut W, body: &[u8]) -> Result<()> {
    let frame = encode_frame(body)?;
    writer.write_binary(frame.to_vec()).await
}
