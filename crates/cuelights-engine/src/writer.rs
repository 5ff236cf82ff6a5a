use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use cuelights_frame::{FrameWriter, Limits, Rejection, StatusUpdate};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::event::LostFlag;

/// The single write path onto the link.
///
/// Operator commands and the listener's error replies share one
/// `Mutex<FrameWriter>`; a frame is written in full while the lock is held.
/// Commands are fire-and-forget: the device confirms a change later with a
/// status report on the read side.
pub struct LinkWriter<W> {
    inner: Arc<Mutex<FrameWriter<W>>>,
    limits: Limits,
    lost: LostFlag,
}

impl<W> Clone for LinkWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            limits: self.limits,
            lost: self.lost.clone(),
        }
    }
}

impl<W> LinkWriter<W> {
    /// Channel and status ranges accepted by this writer.
    pub fn limits(&self) -> Limits {
        self.limits
    }
}

impl<W: Write> LinkWriter<W> {
    pub(crate) fn new(inner: W, limits: Limits, lost: LostFlag) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FrameWriter::new(inner))),
            limits,
            lost,
        }
    }

    /// Set one channel to `status`.
    pub fn write_status(&self, channel: u8, status: u8) -> Result<()> {
        let update = StatusUpdate::new(channel, status);
        self.limits.check(update).map_err(|rejection| self.out_of_range(rejection))?;
        self.with_writer(|writer| writer.send_status(update))?;
        debug!(channel, status, "status command written");
        Ok(())
    }

    /// Set every channel to `status`, one frame per channel.
    ///
    /// A channel whose write times out does not stop the rest; the first
    /// error is returned after all channels have been tried. Losing the
    /// link ends the broadcast at once.
    pub fn write_status_all(&self, status: u8) -> Result<()> {
        if status >= self.limits.num_statuses() {
            return Err(self.out_of_range(Rejection::Status(status)));
        }

        let mut first_err = None;
        for channel in 0..self.limits.num_channels() {
            match self.write_status(channel, status) {
                Ok(()) => {}
                Err(err @ EngineError::LinkLost(_)) => return Err(first_err.unwrap_or(err)),
                Err(err) => {
                    warn!(channel, status, error = %err, "broadcast write failed");
                    first_err.get_or_insert(err);
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Tell the device its frame was not understood.
    pub fn send_error_reply(&self, text: &str) -> Result<()> {
        self.with_writer(|writer| writer.send_error(text))
    }

    fn with_writer(
        &self,
        op: impl FnOnce(&mut FrameWriter<W>) -> cuelights_frame::Result<()>,
    ) -> Result<()> {
        if self.lost.is_set() {
            return Err(EngineError::LinkLost("link already lost".to_string()));
        }

        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut writer).map_err(|err| {
            if err.is_link_lost() {
                let reason = err.to_string();
                self.lost.report(&reason);
                EngineError::LinkLost(reason)
            } else {
                EngineError::Frame(err)
            }
        })
    }

    fn out_of_range(&self, rejection: Rejection) -> EngineError {
        match rejection {
            Rejection::Channel(channel) => EngineError::ChannelOutOfRange {
                channel,
                max: self.limits.num_channels(),
            },
            Rejection::Status(status) => EngineError::StatusOutOfRange {
                status,
                max: self.limits.num_statuses(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::sync::mpsc;

    use cuelights_frame::FrameError;

    use super::*;
    use crate::event::LinkEvent;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn bytes(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn writer(sink: SharedSink) -> LinkWriter<SharedSink> {
        LinkWriter::new(sink, Limits::new(6, 4).unwrap(), LostFlag::default())
    }

    #[test]
    fn write_status_encodes_one_frame() {
        let sink = SharedSink::default();
        writer(sink.clone()).write_status(3, 1).unwrap();
        assert_eq!(sink.bytes(), b"^31");
    }

    #[test]
    fn write_status_all_sends_independent_frames() {
        let sink = SharedSink::default();
        writer(sink.clone()).write_status_all(0).unwrap();
        assert_eq!(sink.bytes(), b"^00^10^20^30^40^50");
    }

    #[test]
    fn out_of_range_requests_write_nothing() {
        let sink = SharedSink::default();
        let w = writer(sink.clone());

        assert!(matches!(
            w.write_status(6, 0),
            Err(EngineError::ChannelOutOfRange { channel: 6, max: 6 })
        ));
        assert!(matches!(
            w.write_status(0, 4),
            Err(EngineError::StatusOutOfRange { status: 4, max: 4 })
        ));
        assert!(matches!(
            w.write_status_all(9),
            Err(EngineError::StatusOutOfRange { status: 9, .. })
        ));
        assert!(sink.bytes().is_empty());
    }

    #[test]
    fn io_failure_is_link_lost() {
        let w = LinkWriter::new(Unplugged, Limits::new(6, 4).unwrap(), LostFlag::default());
        assert!(matches!(w.write_status(0, 0), Err(EngineError::LinkLost(_))));
    }

    #[test]
    fn broadcast_continues_past_a_stalled_write() {
        let sink = FailNth {
            fail_at: 2,
            kind: ErrorKind::TimedOut,
            calls: 0,
            data: Vec::new(),
        };
        let lost = LostFlag::default();
        let w = LinkWriter::new(sink, Limits::new(4, 4).unwrap(), lost.clone());
        let err = w.write_status_all(3).unwrap_err();
        assert!(matches!(err, EngineError::Frame(FrameError::TimedOut)));
        assert!(!lost.is_set());

        let inner = w.inner.lock().unwrap();
        assert_eq!(inner.get_ref().data, b"^03^13^33");
    }

    #[test]
    fn broadcast_stops_once_link_lost() {
        let sink = FailNth {
            fail_at: 1,
            kind: ErrorKind::BrokenPipe,
            calls: 0,
            data: Vec::new(),
        };
        let lost = LostFlag::default();
        let w = LinkWriter::new(sink, Limits::new(4, 4).unwrap(), lost.clone());
        let err = w.write_status_all(3).unwrap_err();
        assert!(matches!(err, EngineError::LinkLost(_)));
        assert!(lost.is_set());

        let inner = w.inner.lock().unwrap();
        assert_eq!(inner.get_ref().calls, 2);
        assert_eq!(inner.get_ref().data, b"^03");
    }

    #[test]
    fn cloned_writer_reports_link_loss_to_consumer() {
        let (tx, rx) = mpsc::channel();
        let lost = LostFlag::default();
        lost.attach(tx);
        let w = LinkWriter::new(Unplugged, Limits::new(6, 4).unwrap(), lost.clone());

        let handle = w.clone();
        assert!(matches!(handle.write_status(0, 1), Err(EngineError::LinkLost(_))));
        assert!(matches!(w.write_status(1, 1), Err(EngineError::LinkLost(_))));

        assert!(lost.is_set());
        let events: Vec<LinkEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], LinkEvent::LinkLost(r) if r.contains("broken pipe")));
    }

    #[test]
    fn writes_refused_once_link_lost() {
        let sink = SharedSink::default();
        let lost = LostFlag::default();
        let w = LinkWriter::new(sink.clone(), Limits::new(6, 4).unwrap(), lost.clone());
        lost.trip();

        assert!(matches!(w.write_status(0, 1), Err(EngineError::LinkLost(_))));
        assert!(sink.bytes().is_empty());
    }

    struct Unplugged;

    impl Write for Unplugged {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Fails the `fail_at`-th write call (0-based) with `kind`, accepts the rest.
    struct FailNth {
        fail_at: usize,
        kind: ErrorKind,
        calls: usize,
        data: Vec<u8>,
    }

    impl Write for FailNth {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let call = self.calls;
            self.calls += 1;
            if call == self.fail_at {
                return Err(std::io::Error::from(self.kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
