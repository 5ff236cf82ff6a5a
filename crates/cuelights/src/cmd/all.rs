use crate::cmd::{check_settable, resolve_status, AllArgs, Context};
use crate::exit::{engine_error, CliResult, SUCCESS};

pub fn run(args: AllArgs, ctx: &Context) -> CliResult<i32> {
    let registry = ctx.registry();
    let status = resolve_status(&registry, &args.status)?;
    check_settable(status, args.force)?;

    let mut engine = ctx.open_engine()?;
    engine
        .write_status_all(status.code())
        .map_err(|err| engine_error("write failed", err))?;
    engine
        .stop()
        .map_err(|err| engine_error("stop failed", err))?;
    Ok(SUCCESS)
}
