use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cuelights_frame::{Decoded, FrameError, FrameReader};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::event::{LinkEvent, LostFlag};
use crate::writer::LinkWriter;

const THREAD_NAME: &str = "cuelights-listener";

/// Why the listener loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerExit {
    /// The stop signal was observed.
    Stopped,
    /// The consumer side hung up.
    ConsumerGone,
    /// Reading or replying failed.
    LinkLost(String),
}

/// Owns the read side of the link and turns bytes into consumer events.
pub struct LinkListener<R, W> {
    reader: FrameReader<R>,
    writer: LinkWriter<W>,
    events: Sender<LinkEvent>,
    stop: Arc<AtomicBool>,
    lost: LostFlag,
}

impl<R: Read, W: Write> LinkListener<R, W> {
    pub(crate) fn new(
        reader: FrameReader<R>,
        writer: LinkWriter<W>,
        events: Sender<LinkEvent>,
        stop: Arc<AtomicBool>,
        lost: LostFlag,
    ) -> Self {
        Self {
            reader,
            writer,
            events,
            stop,
            lost,
        }
    }

    /// Read and dispatch until stopped or the link fails.
    ///
    /// Every valid status report is queued for the consumer before the next
    /// read. Out-of-range frames get an error reply through the shared
    /// writer instead. The stop signal is checked between frames and on
    /// every read timeout.
    pub fn run(mut self) -> ListenerExit {
        info!("listener started");
        let exit = loop {
            if self.stop.load(Ordering::Acquire) {
                break ListenerExit::Stopped;
            }

            match self.reader.read_decoded() {
                Ok(Decoded::Update(update)) => {
                    debug!(
                        channel = update.channel,
                        status = update.status,
                        "status report"
                    );
                    if self.events.send(LinkEvent::Status(update)).is_err() {
                        break ListenerExit::ConsumerGone;
                    }
                }
                Ok(Decoded::Rejected(rejection)) => {
                    warn!(?rejection, "rejecting frame from device");
                    match self.writer.send_error_reply(rejection.reply_text()) {
                        Ok(()) => {}
                        Err(EngineError::LinkLost(reason)) => break self.link_lost(reason),
                        Err(err) => warn!(error = %err, "error reply failed"),
                    }
                }
                Ok(Decoded::DeviceError(text)) => {
                    warn!(%text, "device reported an error");
                }
                Err(FrameError::TimedOut) => continue,
                Err(err) => break self.link_lost(err.to_string()),
            }
        };
        info!(?exit, "listener stopped");
        exit
    }

    fn link_lost(&self, reason: String) -> ListenerExit {
        self.lost.report(&reason);
        ListenerExit::LinkLost(reason)
    }
}

impl<R, W> LinkListener<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    /// Run the listener on its own named thread.
    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<ListenerExit>> {
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())
    }
}
