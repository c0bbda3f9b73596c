//! MessagePack message framing over a byte stream.
//!
//! MessagePack values are self-delimiting, so there is no length header.
//! The reader walks marker bytes as they arrive to find where the current
//! value ends, and only decodes it once all of its bytes are buffered.
//! Bytes past the end of one message stay in the buffer for the next read.
//!
//! # Wire Format
//!
//! ```text
//! <msgpack value><msgpack value>...
//! ```

use std::io;

use anyhow::{anyhow, bail, Context, Result};
use rmp::Marker;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum message size (100MB) to prevent OOM from malicious/buggy servers.
const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Bytes requested from the stream per read.
const READ_CHUNK: usize = 8 * 1024;

/// Read one complete MessagePack value from the stream.
///
/// `pending` holds bytes already received but not yet consumed; it must be
/// the same buffer across calls on one stream.
///
/// # Errors
///
/// Returns an error if:
/// - The stream is closed (EOF) before a full message arrives
/// - The message is larger than MAX_MESSAGE_SIZE (100MB)
/// - The bytes are not valid MessagePack
pub async fn read_message<R>(reader: &mut R, pending: &mut Vec<u8>) -> Result<rmpv::Value>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK];
    let mut boundary = Boundary::new();

    loop {
        if let Some(end) = boundary.advance(pending)? {
            let mut cursor: &[u8] = &pending[..end];
            let value = rmpv::decode::read_value(&mut cursor)
                .map_err(|e| anyhow!(e).context("Invalid MessagePack data"))?;
            if !cursor.is_empty() {
                bail!("Invalid MessagePack data: {} trailing bytes", cursor.len());
            }
            pending.drain(..end);
            return Ok(value);
        }

        let needed = boundary.needed().max(pending.len());
        if needed > MAX_MESSAGE_SIZE {
            bail!(
                "Message size {} exceeds maximum {} bytes",
                needed,
                MAX_MESSAGE_SIZE
            );
        }

        let bytes_read = reader
            .read(&mut chunk)
            .await
            .context("Failed to read from stream")?;

        // EOF - connection closed
        if bytes_read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Connection closed by server",
            )
            .into());
        }
        pending.extend_from_slice(&chunk[..bytes_read]);
    }
}

/// Write one MessagePack value to the stream and flush it.
///
/// # Errors
///
/// Returns an error if encoding, the write, or the flush fails.
pub async fn write_message<W>(writer: &mut W, message: &rmpv::Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut body = Vec::new();
    rmpv::encode::write_value(&mut body, message).context("Failed to encode message")?;

    writer
        .write_all(&body)
        .await
        .context("Failed to write message")?;

    writer.flush().await.context("Failed to flush message")?;

    Ok(())
}

/// Resumable walk over the markers of one MessagePack value.
///
/// Each byte is looked at once however the value is split across reads.
#[derive(Debug)]
struct Boundary {
    /// Offset of the next marker. May run past the buffered bytes while a
    /// payload is still arriving.
    offset: usize,
    /// Values still to walk before the top-level value is complete.
    remaining: u64,
}

/// How the bytes after a marker are laid out.
enum Layout {
    /// A fixed number of payload bytes.
    Fixed(usize),
    /// A `width`-byte big-endian length, then `extra` bytes, then the payload.
    Sized { width: usize, extra: usize },
    /// A container whose element count is in the marker itself.
    Items(u64),
    /// A `width`-byte element count; each element is `per` values.
    Counted { width: usize, per: u64 },
}

impl Boundary {
    fn new() -> Self {
        Self {
            offset: 0,
            remaining: 1,
        }
    }

    /// Bytes known to be needed so far.
    fn needed(&self) -> usize {
        self.offset
    }

    /// Walk as far as `buf` allows. Returns the length of the value once
    /// all of it is buffered.
    fn advance(&mut self, buf: &[u8]) -> Result<Option<usize>> {
        while self.remaining > 0 {
            let Some(&byte) = buf.get(self.offset) else {
                return Ok(None);
            };
            let start = self.offset + 1;

            let (next, children) = match layout(Marker::from_u8(byte))? {
                Layout::Fixed(len) => (start.saturating_add(len), 0),
                Layout::Items(count) => (start, count),
                Layout::Sized { width, extra } => match read_len(buf, start, width) {
                    Some(len) => (start.saturating_add(width + extra).saturating_add(len), 0),
                    None => return Ok(None),
                },
                Layout::Counted { width, per } => match read_len(buf, start, width) {
                    Some(count) => (start + width, per.saturating_mul(count as u64)),
                    None => return Ok(None),
                },
            };

            self.offset = next;
            self.remaining = (self.remaining - 1).saturating_add(children);
        }

        Ok((self.offset <= buf.len()).then_some(self.offset))
    }
}

fn layout(marker: Marker) -> Result<Layout> {
    let layout = match marker {
        Marker::FixPos(_) | Marker::FixNeg(_) | Marker::Null | Marker::True | Marker::False => {
            Layout::Fixed(0)
        }
        Marker::U8 | Marker::I8 => Layout::Fixed(1),
        Marker::U16 | Marker::I16 => Layout::Fixed(2),
        Marker::U32 | Marker::I32 | Marker::F32 => Layout::Fixed(4),
        Marker::U64 | Marker::I64 | Marker::F64 => Layout::Fixed(8),
        Marker::FixStr(len) => Layout::Fixed(usize::from(len)),
        Marker::Str8 | Marker::Bin8 => Layout::Sized { width: 1, extra: 0 },
        Marker::Str16 | Marker::Bin16 => Layout::Sized { width: 2, extra: 0 },
        Marker::Str32 | Marker::Bin32 => Layout::Sized { width: 4, extra: 0 },
        // ext payloads carry a type byte before the data
        Marker::FixExt1 => Layout::Fixed(2),
        Marker::FixExt2 => Layout::Fixed(3),
        Marker::FixExt4 => Layout::Fixed(5),
        Marker::FixExt8 => Layout::Fixed(9),
        Marker::FixExt16 => Layout::Fixed(17),
        Marker::Ext8 => Layout::Sized { width: 1, extra: 1 },
        Marker::Ext16 => Layout::Sized { width: 2, extra: 1 },
        Marker::Ext32 => Layout::Sized { width: 4, extra: 1 },
        Marker::FixArray(len) => Layout::Items(u64::from(len)),
        Marker::FixMap(len) => Layout::Items(2 * u64::from(len)),
        Marker::Array16 => Layout::Counted { width: 2, per: 1 },
        Marker::Array32 => Layout::Counted { width: 4, per: 1 },
        Marker::Map16 => Layout::Counted { width: 2, per: 2 },
        Marker::Map32 => Layout::Counted { width: 4, per: 2 },
        Marker::Reserved => bail!("Invalid MessagePack data: reserved marker 0xc1"),
    };
    Ok(layout)
}

/// Big-endian length of `width` bytes at `at`, if buffered.
fn read_len(buf: &[u8], at: usize, width: usize) -> Option<usize> {
    let bytes = buf.get(at..at + width)?;
    Some(bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;
    use tokio::time::timeout;

    /// Test timeout to prevent hanging tests.
    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    fn encode(value: &rmpv::Value) -> Vec<u8> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, value).expect("encode");
        buf
    }

    fn sample() -> rmpv::Value {
        rmpv::Value::Array(vec![
            rmpv::Value::from(0),
            rmpv::Value::from(1),
            rmpv::Value::from("getFoil"),
            rmpv::Value::Array(vec![rmpv::Value::from("MH 60  10.08%")]),
        ])
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let (mut client, mut server) = duplex(1024);

        write_message(&mut client, &sample()).await.expect("Write failed");

        let mut pending = Vec::new();
        let received = timeout(TEST_TIMEOUT, read_message(&mut server, &mut pending))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(received, sample());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_read_message_split_across_writes() {
        let (mut client, mut server) = duplex(1024);
        let bytes = encode(&sample());
        let (head, tail) = bytes.split_at(5);

        let writer = tokio::spawn({
            let head = head.to_vec();
            let tail = tail.to_vec();
            async move {
                client.write_all(&head).await.expect("Write failed");
                tokio::time::sleep(Duration::from_millis(20)).await;
                client.write_all(&tail).await.expect("Write failed");
                client
            }
        });

        let mut pending = Vec::new();
        let received = timeout(TEST_TIMEOUT, read_message(&mut server, &mut pending))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(received, sample());
        writer.await.expect("writer task");
    }

    #[tokio::test]
    async fn test_read_message_one_byte_at_a_time() {
        // a one-byte pipe splits every header and length field
        let (mut client, mut server) = duplex(1);
        let value = rmpv::Value::Map(vec![
            (
                rmpv::Value::from("name"),
                rmpv::Value::from("a foil name longer than thirty-one bytes"),
            ),
            (
                rmpv::Value::from("coords"),
                rmpv::Value::Array((0..20).map(|i| rmpv::Value::F64(f64::from(i))).collect()),
            ),
            (rmpv::Value::from("n"), rmpv::Value::from(70000)),
        ]);
        let bytes = encode(&value);

        let writer = tokio::spawn(async move {
            client.write_all(&bytes).await.expect("Write failed");
            client
        });

        let mut pending = Vec::new();
        let received = timeout(TEST_TIMEOUT, read_message(&mut server, &mut pending))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(received, value);
        assert!(pending.is_empty());
        writer.await.expect("writer task");
    }

    #[tokio::test]
    async fn test_large_message_reads_in_linear_time() {
        // about 9.4MB; re-decoding the whole buffer on every chunk takes
        // minutes at this size
        let value = rmpv::Value::Array(
            (0..1_048_576)
                .map(|i| rmpv::Value::F64(f64::from(i) * 0.5))
                .collect(),
        );
        let bytes = encode(&value);
        assert!(bytes.len() > 9_000_000);

        let (mut client, mut server) = duplex(64 * 1024);
        let writer = tokio::spawn(async move {
            client.write_all(&bytes).await.expect("Write failed");
            client
        });

        let mut pending = Vec::new();
        let received = timeout(
            Duration::from_secs(10),
            read_message(&mut server, &mut pending),
        )
        .await
        .expect("Large message took too long")
        .expect("Read failed");

        assert_eq!(received.as_array().map(Vec::len), Some(1_048_576));
        assert_eq!(received, value);
        writer.await.expect("writer task");
    }

    #[tokio::test]
    async fn test_oversized_message_rejected_from_header() {
        let (mut client, mut server) = duplex(64);
        // bin32 header announcing 200MB; the body never comes
        let mut header = vec![0xc6];
        header.extend_from_slice(&(200u32 * 1024 * 1024).to_be_bytes());
        client.write_all(&header).await.expect("Write failed");

        let mut pending = Vec::new();
        let err = timeout(TEST_TIMEOUT, read_message(&mut server, &mut pending))
            .await
            .expect("Test timed out")
            .unwrap_err();

        assert!(
            err.to_string().contains("exceeds maximum"),
            "got: {}",
            err
        );
        drop(client);
    }

    #[tokio::test]
    async fn test_reserved_marker_is_invalid() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x92, 0x01, 0xc1]).await.expect("Write failed");

        let mut pending = Vec::new();
        let err = timeout(TEST_TIMEOUT, read_message(&mut server, &mut pending))
            .await
            .expect("Test timed out")
            .unwrap_err();

        assert!(err.to_string().contains("Invalid MessagePack"), "got: {}", err);
        drop(client);
    }

    #[tokio::test]
    async fn test_back_to_back_messages_are_kept_apart() {
        let (mut client, mut server) = duplex(1024);
        let mut bytes = encode(&rmpv::Value::from("first"));
        bytes.extend(encode(&rmpv::Value::from("second")));
        client.write_all(&bytes).await.expect("Write failed");

        let mut pending = Vec::new();
        let first = read_message(&mut server, &mut pending).await.expect("first");
        let second = read_message(&mut server, &mut pending).await.expect("second");

        assert_eq!(first.as_str(), Some("first"));
        assert_eq!(second.as_str(), Some("second"));
    }

    #[tokio::test]
    async fn test_connection_closed_returns_error() {
        let (client, mut server) = duplex(64);

        // Close write end immediately without sending anything
        drop(client);

        let mut pending = Vec::new();
        let result = timeout(TEST_TIMEOUT, read_message(&mut server, &mut pending))
            .await
            .expect("Test timed out");

        let err_msg = result.unwrap_err().to_string();
        assert!(
            err_msg.contains("closed"),
            "Expected connection closed error, got: {}",
            err_msg
        );
    }

    #[tokio::test]
    async fn test_truncated_message_then_eof() {
        let (mut client, mut server) = duplex(64);
        let bytes = encode(&sample());
        client.write_all(&bytes[..bytes.len() - 2]).await.expect("Write failed");
        drop(client);

        let mut pending = Vec::new();
        let result = read_message(&mut server, &mut pending).await;
        assert!(result.is_err());
    }
}
