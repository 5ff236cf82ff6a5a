use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::codec::{Decoded, Decoder, Limits};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 64;

/// Reads decoded frames from any `Read` stream.
///
/// Bytes read past the end of a frame are kept for the next call, so frames
/// split across reads or packed into one read decode the same way.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    decoder: Decoder,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T, limits: Limits) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            decoder: Decoder::new(limits),
        }
    }

    /// Read until the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::TimedOut)` when the stream's read timeout
    /// elapses with no complete frame; the partial frame is kept and
    /// decoding resumes on the next call. Returns
    /// `Err(FrameError::ConnectionClosed)` at end-of-stream.
    pub fn read_decoded(&mut self) -> Result<Decoded> {
        loop {
            while self.buf.has_remaining() {
                let byte = self.buf.get_u8();
                if let Some(decoded) = self.decoder.push(byte) {
                    return Ok(decoded);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Err(FrameError::TimedOut)
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// The decoder driving this reader.
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
