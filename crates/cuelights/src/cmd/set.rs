use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cuelights_engine::{ChannelBoard, LinkEvent};
use cuelights_frame::StatusUpdate;

use crate::cmd::{channel_index, check_settable, parse_duration, resolve_status, Context, SetArgs};
use crate::exit::{engine_error, CliError, CliResult, LINK_LOST, SUCCESS, TIMEOUT};
use crate::output::print_update;

pub fn run(args: SetArgs, ctx: &Context) -> CliResult<i32> {
    let registry = ctx.registry();
    let status = resolve_status(&registry, &args.status)?;
    check_settable(status, args.force)?;
    let status = status.code();
    let channel = channel_index(args.channel, ctx.num_channels)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;

    let mut engine = ctx.open_engine()?;

    let events = if args.wait {
        let (tx, rx) = mpsc::channel();
        engine
            .bind_consumer(move |event| {
                let _ = tx.send(event);
            })
            .map_err(|err| engine_error("bind failed", err))?;
        engine
            .start()
            .map_err(|err| engine_error("start failed", err))?;
        Some(rx)
    } else {
        None
    };

    engine
        .write_status(channel, status)
        .map_err(|err| engine_error("write failed", err))?;

    if let Some(events) = events {
        let expected = StatusUpdate { channel, status };
        let confirmed = wait_for_confirmation(&events, expected, wait_timeout)?;
        let mut board = ChannelBoard::new(ctx.num_channels, Arc::clone(&registry));
        if let Some(channel) = board.apply(confirmed) {
            print_update(channel, ctx.format);
        }
    }

    engine
        .stop()
        .map_err(|err| engine_error("stop failed", err))?;
    Ok(SUCCESS)
}

/// Wait until the controller reports `expected`. Reports for other
/// channels are skipped.
fn wait_for_confirmation(
    events: &Receiver<LinkEvent>,
    expected: StatusUpdate,
    timeout: Duration,
) -> CliResult<StatusUpdate> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(LinkEvent::Status(update)) if update == expected => return Ok(update),
            Ok(LinkEvent::Status(_)) => continue,
            Ok(LinkEvent::LinkLost(reason)) => {
                return Err(CliError::new(LINK_LOST, format!("link lost: {reason}")));
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                return Err(CliError::new(
                    TIMEOUT,
                    format!(
                        "controller did not confirm channel {} within {timeout:?}",
                        expected.channel + 1
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_skips_unrelated_reports() {
        let (tx, rx) = mpsc::channel();
        let expected = StatusUpdate {
            channel: 2,
            status: 3,
        };
        tx.send(LinkEvent::Status(StatusUpdate {
            channel: 0,
            status: 1,
        }))
        .unwrap();
        tx.send(LinkEvent::Status(expected)).unwrap();

        let got = wait_for_confirmation(&rx, expected, Duration::from_secs(1)).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn confirmation_times_out() {
        let (tx, rx) = mpsc::channel::<LinkEvent>();
        let expected = StatusUpdate {
            channel: 0,
            status: 1,
        };
        let err = wait_for_confirmation(&rx, expected, Duration::from_millis(20)).unwrap_err();
        assert_eq!(err.code, TIMEOUT);
        drop(tx);
    }

    #[test]
    fn confirmation_reports_link_lost() {
        let (tx, rx) = mpsc::channel();
        tx.send(LinkEvent::LinkLost("unplugged".to_string())).unwrap();
        let expected = StatusUpdate {
            channel: 0,
            status: 1,
        };
        let err = wait_for_confirmation(&rx, expected, Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.code, LINK_LOST);
        assert!(err.message.contains("unplugged"));
    }
}
