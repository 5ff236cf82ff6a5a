use cuelights_link::available_ports;

use crate::cmd::Context;
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::print_ports;

pub fn run(ctx: &Context) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| link_error("cannot list serial ports", err))?;
    print_ports(&ports, ctx.format);
    Ok(SUCCESS)
}
