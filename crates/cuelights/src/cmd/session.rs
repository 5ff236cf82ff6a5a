use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cuelights_engine::{ChannelBoard, CueEngine, LinkEvent};
use cuelights_link::SerialLink;

use crate::cmd::Context;
use crate::exit::{engine_error, CliError, CliResult, INTERNAL, LINK_LOST};
use crate::output::{print_board, print_link_lost, print_update, OutputFormat};

/// A running engine whose consumer keeps a [`ChannelBoard`] and prints
/// every report.
pub struct Session {
    pub engine: CueEngine<SerialLink, SerialLink>,
    pub board: Arc<Mutex<ChannelBoard>>,
    lost: Arc<Mutex<Option<String>>>,
    reports: Arc<AtomicUsize>,
}

impl Session {
    pub fn start(ctx: &Context, show_board: bool) -> CliResult<Self> {
        let mut engine = ctx.open_engine()?;
        let board = Arc::new(Mutex::new(ChannelBoard::new(
            ctx.num_channels,
            Arc::clone(engine.registry()),
        )));
        let lost = Arc::new(Mutex::new(None));
        let reports = Arc::new(AtomicUsize::new(0));

        let consumer = Consumer {
            board: Arc::clone(&board),
            lost: Arc::clone(&lost),
            reports: Arc::clone(&reports),
            format: ctx.format,
            show_board,
        };
        engine
            .bind_consumer(move |event| consumer.handle(event))
            .map_err(|err| engine_error("bind failed", err))?;
        engine
            .start()
            .map_err(|err| engine_error("start failed", err))?;

        Ok(Self {
            engine,
            board,
            lost,
            reports,
        })
    }

    /// Status reports delivered so far.
    pub fn reports(&self) -> usize {
        self.reports.load(Ordering::Acquire)
    }

    /// Reason the link was lost, if it was.
    pub fn lost(&self) -> Option<String> {
        self.lost
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn print_board(&self, format: OutputFormat) {
        let board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        print_board(&board, format);
    }

    /// Stop the engine and turn a lost link into an error exit.
    pub fn finish(mut self) -> CliResult<()> {
        self.engine
            .stop()
            .map_err(|err| engine_error("stop failed", err))?;
        match self.lost() {
            Some(reason) => Err(CliError::new(LINK_LOST, format!("link lost: {reason}"))),
            None => Ok(()),
        }
    }
}

struct Consumer {
    board: Arc<Mutex<ChannelBoard>>,
    lost: Arc<Mutex<Option<String>>>,
    reports: Arc<AtomicUsize>,
    format: OutputFormat,
    show_board: bool,
}

impl Consumer {
    fn handle(&self, event: LinkEvent) {
        match event {
            LinkEvent::Status(update) => {
                let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(channel) = board.apply(update) {
                    print_update(channel, self.format);
                }
                if self.show_board {
                    print_board(&board, self.format);
                }
                self.reports.fetch_add(1, Ordering::AcqRel);
            }
            LinkEvent::LinkLost(reason) => {
                print_link_lost(&reason, self.format);
                *self.lost.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
            }
        }
    }
}

/// Flag cleared by Ctrl-C.
pub fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}
