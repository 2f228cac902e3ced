//! Bounded byte sources
//!
//! Both readers stop one byte past the limit, so an oversized stream is
//! rejected without being buffered in full.

use rpcwire_core::{Error, Result};
use std::io::Read;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read `reader` to EOF, failing once more than `limit` bytes arrive
///
/// ```rust
/// use rpcwire_io::read_all;
///
/// let bytes = read_all(&b"{\"jsonrpc\":\"2.0\"}"[..], 64, 1024).unwrap();
/// assert_eq!(bytes.len(), 17);
/// assert!(read_all(&b"0123456789"[..], 4, 9).is_err());
/// ```
pub fn read_all<R: Read>(reader: R, size_hint: usize, limit: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(size_hint.min(limit));
    reader.take(ceiling(limit)).read_to_end(&mut buf)?;
    check_limit(buf, limit)
}

/// Async variant of [`read_all`]
pub async fn read_all_async<R: AsyncRead + Unpin>(reader: R, size_hint: usize, limit: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(size_hint.min(limit));
    reader.take(ceiling(limit)).read_to_end(&mut buf).await?;
    check_limit(buf, limit)
}

fn ceiling(limit: usize) -> u64 {
    (limit as u64).saturating_add(1)
}

fn check_limit(buf: Vec<u8>, limit: usize) -> Result<Vec<u8>> {
    if buf.len() > limit {
        tracing::warn!(limit, "payload exceeds size ceiling");
        return Err(Error::MessageTooLarge { limit });
    }
    tracing::trace!(bytes = buf.len(), "payload read");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
        }
    }

    #[test]
    fn test_read_exact_limit() {
        let bytes = read_all(&b"12345"[..], 0, 5).unwrap();
        assert_eq!(bytes, b"12345");
    }

    #[test]
    fn test_read_over_limit() {
        let err = read_all(&b"123456"[..], 0, 5).unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { limit: 5 }));
    }

    #[test]
    fn test_read_empty_source() {
        assert!(read_all(io::empty(), 16, 5).unwrap().is_empty());
    }

    #[test]
    fn test_read_failure_is_io() {
        assert!(matches!(read_all(FailingReader, 16, 5), Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_read_async_limits() {
        let bytes = read_all_async(&b"abc"[..], 8, 3).await.unwrap();
        assert_eq!(bytes, b"abc");

        let err = read_all_async(&b"abcd"[..], 8, 3).await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { limit: 3 }));
    }
}
