use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crate::cmd::session::{install_ctrlc_handler, Session};
use crate::cmd::{Context, MonitorArgs};
use crate::exit::{CliResult, SUCCESS};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: MonitorArgs, ctx: &Context) -> CliResult<i32> {
    let running = install_ctrlc_handler()?;
    let session = Session::start(ctx, args.board)?;

    while running.load(Ordering::SeqCst) && session.lost().is_none() {
        if let Some(count) = args.count {
            if session.reports() >= count {
                break;
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    session.finish()?;
    Ok(SUCCESS)
}
