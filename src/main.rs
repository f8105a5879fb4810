//! Entry point.

use std::process;

use structopt::StructOpt;

mod db;
mod error;
mod logging;
mod opts;
mod pipeline;
mod prelude;
mod reading;
mod scheduler;
mod services;
mod settings;

use crate::opts::Opts;
use crate::pipeline::{Pipeline, TickOutcome};
use crate::services::facility::Facility;
use crate::services::openweather::OpenWeather;
use crate::prelude::*;

const EXIT_OK: i32 = 0;
const EXIT_ABORTED: i32 = 1;
const EXIT_CONFIGURATION: i32 = 2;

fn main() {
    let opts = Opts::from_args();
    if let Err(error) = logging::init(&opts) {
        eprintln!("failed to initialize logging: {}", error);
        process::exit(EXIT_CONFIGURATION);
    }
    process::exit(run(&opts));
}

fn run(opts: &Opts) -> i32 {
    info!("Reading settings…");
    let settings = match settings::read(&opts.settings) {
        Ok(settings) => settings,
        Err(error) => {
            error!("Configuration error: {:#}.", error);
            return EXIT_CONFIGURATION;
        }
    };
    debug!("Settings: {:?}", &settings);

    let source = match Facility::new(&settings.facility) {
        Ok(source) => source,
        Err(error) => {
            error!("Configuration error: {:#}.", error);
            return EXIT_CONFIGURATION;
        }
    };
    let provider = OpenWeather::new(settings.weather.clone());

    info!("Opening database {}…", opts.db.display());
    let db = match Db::open(&opts.db) {
        Ok(db) => db,
        Err(error) => {
            error!("Could not open the database: {}.", error);
            return EXIT_ABORTED;
        }
    };

    let pipeline = Pipeline::new(
        &db,
        &source,
        &provider,
        settings.weather.retries,
        std::time::Duration::from_secs(settings.weather.retry_delay_secs),
    );

    if opts.daemon {
        scheduler::run(&pipeline, settings.hours.as_ref())
    } else {
        run_once(&pipeline, settings.hours.as_ref())
    }
}

/// One cycle for invocation by an external scheduler.
fn run_once(pipeline: &Pipeline, hours: Option<&crate::settings::OperatingHours>) -> i32 {
    let now = Local::now();
    if let Some(hours) = hours {
        if !hours.is_open_at(&now) {
            info!("Closed now, skipping the cycle.");
            return EXIT_OK;
        }
    }
    match pipeline.run_tick(now) {
        Ok(TickOutcome::Full) | Ok(TickOutcome::PartialWeather) | Ok(TickOutcome::AlreadyLogged) => EXIT_OK,
        Err(error) => {
            error!("Tick failed: {}.", error);
            EXIT_ABORTED
        }
    }
}
