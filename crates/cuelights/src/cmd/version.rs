use cuelights_frame::{MAX_WIRE_VALUES, START_MARKER};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("cuelights {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: cuelights");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("CUELIGHTS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "protocol: start={:?}, max_channels={MAX_WIRE_VALUES}, max_statuses={MAX_WIRE_VALUES}",
        char::from(START_MARKER)
    );
    println!(
        "features: engine={}, cli=true",
        cfg!(feature = "engine")
    );

    Ok(SUCCESS)
}
