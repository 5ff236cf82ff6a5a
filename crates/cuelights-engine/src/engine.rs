use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cuelights_frame::{FrameReader, Limits, StatusRegistry};
use cuelights_link::{LinkConfig, SerialLink};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::event::{LinkEvent, LostFlag};
use crate::listener::{LinkListener, ListenerExit};
use crate::writer::LinkWriter;

const DISPATCH_THREAD_NAME: &str = "cuelights-dispatch";

type Consumer = Box<dyn FnMut(LinkEvent) + Send + 'static>;

/// The channel status protocol engine.
///
/// Owns both halves of the link. After [`CueEngine::start`] a listener
/// thread decodes inbound frames and a single dispatch thread hands each
/// [`LinkEvent`] to the bound consumer, in arrival order, one at a time.
/// Commands written through [`CueEngine::write_status`] and
/// [`CueEngine::write_status_all`] share a lock with the listener's error
/// replies.
pub struct CueEngine<R, W> {
    config: EngineConfig,
    writer: LinkWriter<W>,
    reader: Option<FrameReader<R>>,
    consumer: Option<Consumer>,
    lost: LostFlag,
    stop: Arc<AtomicBool>,
    listener: Option<JoinHandle<ListenerExit>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl CueEngine<SerialLink, SerialLink> {
    /// Open the serial device and build an engine over it.
    ///
    /// Failing to open the device is fatal; nothing is retried.
    pub fn open(link: &LinkConfig, config: EngineConfig) -> Result<Self> {
        let writer = SerialLink::open(link)?;
        let reader = writer.try_clone()?;
        Self::new(reader, writer, config)
    }
}

impl<R, W> CueEngine<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    /// Build an engine over an already-open read half and write half.
    pub fn new(reader: R, writer: W, config: EngineConfig) -> Result<Self> {
        let limits = config.limits()?;
        let lost = LostFlag::default();
        Ok(Self {
            writer: LinkWriter::new(writer, limits, lost.clone()),
            reader: Some(FrameReader::new(reader, limits)),
            consumer: None,
            lost,
            stop: Arc::new(AtomicBool::new(false)),
            listener: None,
            dispatcher: None,
            config,
        })
    }

    /// Register the single consumer of link events.
    ///
    /// Must be called before [`CueEngine::start`]; binding again replaces
    /// the previous handler.
    pub fn bind_consumer<F>(&mut self, handler: F) -> Result<()>
    where
        F: FnMut(LinkEvent) + Send + 'static,
    {
        if self.is_started() {
            return Err(EngineError::AlreadyStarted);
        }
        self.consumer = Some(Box::new(handler));
        Ok(())
    }

    /// Start the dispatch and listener threads.
    pub fn start(&mut self) -> Result<()> {
        if self.is_started() {
            return Err(EngineError::AlreadyStarted);
        }
        let consumer = self.consumer.take().ok_or(EngineError::NoConsumer)?;
        let reader = self.reader.take().ok_or(EngineError::AlreadyStarted)?;

        let (tx, rx) = mpsc::channel();

        let dispatcher = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || dispatch(rx, consumer))
            .map_err(|source| EngineError::Spawn {
                name: DISPATCH_THREAD_NAME,
                source,
            })?;
        self.dispatcher = Some(dispatcher);
        self.lost.attach(tx.clone());

        let listener = LinkListener::new(
            reader,
            self.writer.clone(),
            tx,
            Arc::clone(&self.stop),
            self.lost.clone(),
        )
        .spawn()
        .map_err(|source| EngineError::Spawn {
            name: "listener",
            source,
        })?;
        self.listener = Some(listener);

        info!(
            channels = self.config.num_channels,
            statuses = self.config.registry.num_statuses(),
            "engine started"
        );
        Ok(())
    }

    /// Ask the device to set one channel.
    ///
    /// A write that finds the link gone is reported to the consumer as
    /// [`LinkEvent::LinkLost`], as are failures on any clone of
    /// [`CueEngine::writer`].
    pub fn write_status(&self, channel: u8, status: u8) -> Result<()> {
        self.writer.write_status(channel, status)
    }

    /// Ask the device to set every channel, one frame each.
    pub fn write_status_all(&self, status: u8) -> Result<()> {
        self.writer.write_status_all(status)
    }
}

impl<R, W> CueEngine<R, W> {
    /// Stop the listener, drain queued events and join both threads.
    ///
    /// Safe to call more than once. The listener notices the stop signal at
    /// its next read timeout.
    pub fn stop(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Release);

        if let Some(listener) = self.listener.take() {
            match listener.join() {
                Ok(exit) => debug!(?exit, "listener joined"),
                Err(_) => warn!("listener thread panicked"),
            }
        }

        // Dropping the last sender lets the dispatcher drain and return.
        self.lost.detach();

        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.join().is_err() {
                warn!("consumer panicked");
            }
            info!("engine stopped");
        }
        Ok(())
    }

    /// True once started, until stopped.
    pub fn is_running(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// True once any read or write has failed on the link.
    pub fn is_link_lost(&self) -> bool {
        self.lost.is_set()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<StatusRegistry> {
        &self.config.registry
    }

    /// Cloneable handle to the locked write path.
    pub fn writer(&self) -> &LinkWriter<W> {
        &self.writer
    }

    pub fn limits(&self) -> Limits {
        self.writer.limits()
    }

    fn is_started(&self) -> bool {
        self.reader.is_none()
    }
}

impl<R, W> Drop for CueEngine<R, W> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn dispatch(events: Receiver<LinkEvent>, mut consumer: Consumer) {
    for event in events {
        consumer(event);
    }
    debug!("dispatch queue closed");
}
