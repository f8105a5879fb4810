//! Boundary-aligned collection loop.

use crate::pipeline::{Pipeline, TickOutcome};
use crate::reading::TICK_INTERVAL_SECS;
use crate::settings::OperatingHours;
use crate::prelude::*;

/// Runs one cycle immediately, then one at every quarter-hour boundary.
/// A failed tick is logged and the loop carries on to the next boundary.
pub fn run(pipeline: &Pipeline, hours: Option<&OperatingHours>) -> ! {
    warn_about_gap(pipeline);
    loop {
        cycle(pipeline, hours);
        sleep_until(next_boundary(Local::now()));
    }
}

/// One gated cycle: skipped with a log line outside the operating hours.
pub fn cycle(pipeline: &Pipeline, hours: Option<&OperatingHours>) {
    let now = Local::now();
    if let Some(hours) = hours {
        if !hours.is_open_at(&now) {
            match hours.next_opening(&now) {
                Some(opening) => info!("Closed now, next opening at {}.", opening),
                None => info!("Closed now."),
            }
            return;
        }
    }
    match pipeline.run_tick(now) {
        Ok(TickOutcome::Full) | Ok(TickOutcome::PartialWeather) | Ok(TickOutcome::AlreadyLogged) => {}
        Err(error) => error!("Tick failed: {}.", error),
    }
}

/// Warns when the newest stored reading is stale, the host may have slept.
fn warn_about_gap(pipeline: &Pipeline) {
    match pipeline.db().select_last_timestamp() {
        Ok(Some(last)) => {
            let age = Local::now() - last;
            if age > chrono::Duration::hours(1) {
                warn!("The last reading is {} hours old ({}), resuming now.", age.num_hours(), last);
            }
        }
        Ok(None) => {}
        Err(error) => warn!("Could not check the last reading: {}.", error),
    }
}

/// The first tick boundary strictly after the given moment.
pub fn next_boundary(after: DateTime<Local>) -> DateTime<Local> {
    let next = (after.timestamp().div_euclid(TICK_INTERVAL_SECS) + 1) * TICK_INTERVAL_SECS;
    DateTime::from_timestamp(next, 0)
        .map(|next| next.with_timezone(&Local))
        .unwrap_or(after)
}

fn sleep_until(deadline: DateTime<Local>) {
    debug!("Sleeping until {}…", deadline);
    if let Ok(duration) = (deadline - Local::now()).to_std() {
        std::thread::sleep(duration);
    }
}
