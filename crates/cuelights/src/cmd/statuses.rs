use crate::cmd::Context;
use crate::exit::{CliResult, SUCCESS};
use crate::output::print_statuses;

pub fn run(ctx: &Context) -> CliResult<i32> {
    print_statuses(&ctx.registry(), ctx.format);
    Ok(SUCCESS)
}
