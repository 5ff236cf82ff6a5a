use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_command, encode_error, StatusUpdate};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Writes complete frames to any `Write` stream.
///
/// Each call encodes one frame and writes all of it before returning, so a
/// writer shared behind a lock never lets two frames interleave.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Send a status command (blocking).
    pub fn send_status(&mut self, update: StatusUpdate) -> Result<()> {
        self.buf.clear();
        encode_command(update, &mut self.buf);
        self.write_buffered()
    }

    /// Send an error notification (blocking).
    pub fn send_error(&mut self, text: &str) -> Result<()> {
        self.buf.clear();
        encode_error(text, &mut self.buf);
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => return Err(FrameError::TimedOut),
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::{Decoded, Decoder, Limits};

    #[test]
    fn write_status_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_status(StatusUpdate::new(4, 2)).unwrap();
        assert_eq!(writer.into_inner().into_inner(), b"^42");
    }

    #[test]
    fn write_error_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_error("status not understood").unwrap();
        assert_eq!(
            writer.into_inner().into_inner(),
            b"^Estatus not understood\n"
        );
    }

    #[test]
    fn written_frames_decode() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_status(StatusUpdate::new(0, 3)).unwrap();
        writer.send_error("hello").unwrap();
        writer.send_status(StatusUpdate::new(5, 0)).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut decoder = Decoder::new(Limits::new(6, 4).unwrap());
        assert_eq!(
            decoder.feed(&wire),
            vec![
                Decoded::Update(StatusUpdate::new(0, 3)),
                Decoded::DeviceError("hello".to_string()),
                Decoded::Update(StatusUpdate::new(5, 0)),
            ]
        );
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send_status(StatusUpdate::new(1, 1)).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = FrameWriter::new(OneByteWriter::default());
        writer.send_error("abc").unwrap();
        let inner = writer.into_inner();
        assert_eq!(inner.data, b"^Eabc\n");
        assert_eq!(inner.calls, 6);
    }

    #[test]
    fn handles_interrupted_and_would_block() {
        let mut writer = FrameWriter::new(FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            data: Vec::new(),
        });
        writer.send_status(StatusUpdate::new(2, 2)).unwrap();
        assert_eq!(writer.into_inner().data, b"^22");
    }

    #[test]
    fn stalled_write_is_a_timeout_not_an_io_failure() {
        let mut writer = FrameWriter::new(FlakyWriter {
            failures: vec![ErrorKind::TimedOut],
            data: Vec::new(),
        });
        let err = writer.send_status(StatusUpdate::new(1, 3)).unwrap_err();
        assert!(matches!(err, FrameError::TimedOut));
        assert!(!err.is_link_lost());

        writer.send_status(StatusUpdate::new(1, 3)).unwrap();
        assert_eq!(writer.into_inner().data, b"^13");
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send_status(StatusUpdate::new(0, 0)).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct OneByteWriter {
        data: Vec<u8>,
        calls: usize,
    }

    impl Write for OneByteWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.failures.is_empty() {
                return Err(std::io::Error::from(self.failures.remove(0)));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
