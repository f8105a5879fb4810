use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use crate::opts::Opts;
use crate::prelude::*;

pub fn init(opts: &Opts) -> Result {
    let mut config_builder = ConfigBuilder::new();
    config_builder
        .set_target_level(LevelFilter::Error)
        .set_location_level(LevelFilter::Debug)
        .add_filter_allow_str("gymlog");
    if opts.suppress_log_timestamps {
        config_builder.set_time_level(LevelFilter::Off);
    }
    // The local offset is not always available, UTC timestamps are fine then.
    let _ = config_builder.set_time_offset_to_local();
    TermLogger::init(
        if opts.silent {
            LevelFilter::Warn
        } else if opts.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        config_builder.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}
