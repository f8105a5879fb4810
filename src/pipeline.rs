//! One collection cycle: occupancy, weather, persist.

use std::time::Duration;

use crate::reading::align_to_tick;
use crate::services::{OccupancySource, Weather, WeatherProvider};
use crate::prelude::*;

/// How a completed tick ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Row stored with full weather enrichment.
    Full,

    /// Weather enrichment failed, row stored with empty weather columns.
    PartialWeather,

    /// A reading for this tick is already stored, nothing was written.
    AlreadyLogged,
}

pub struct Pipeline<'a> {
    db: &'a Db,
    source: &'a dyn OccupancySource,
    provider: &'a dyn WeatherProvider,
    retries: u32,
    retry_delay: Duration,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        db: &'a Db,
        source: &'a dyn OccupancySource,
        provider: &'a dyn WeatherProvider,
        retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            db,
            source,
            provider,
            retries,
            retry_delay,
        }
    }

    pub fn db(&self) -> &Db {
        self.db
    }

    /// Runs one tick to completion. A weather failure degrades the reading,
    /// an occupancy or storage failure aborts the tick with nothing written.
    pub fn run_tick(&self, now: DateTime<Local>) -> Result<TickOutcome, TickError> {
        let timestamp = align_to_tick(now);

        let occupancy_count = match self.source.read_occupancy() {
            Ok(count) => count,
            Err(error) => {
                self.journal(&timestamp, "occupancy", &error);
                return Err(error.into());
            }
        };
        debug!("Occupancy at {}: {}.", timestamp, occupancy_count);

        let weather = self.fetch_weather(&timestamp);

        let reading = Reading {
            timestamp,
            occupancy_count,
            temperature: weather.map(|weather| weather.temperature),
            precipitation: weather.map(|weather| weather.precipitation),
        };
        match self.db.insert_reading(&reading) {
            Ok(()) if weather.is_some() => {
                info!("Logged occupancy {} at {}.", occupancy_count, timestamp);
                Ok(TickOutcome::Full)
            }
            Ok(()) => {
                info!("Logged occupancy {} at {} without weather.", occupancy_count, timestamp);
                Ok(TickOutcome::PartialWeather)
            }
            Err(StorageError::DuplicateTimestamp(timestamp)) => {
                warn!("A reading for {} is already stored, skipping.", timestamp);
                self.journal(&timestamp, "duplicate", &"tick already logged");
                Ok(TickOutcome::AlreadyLogged)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Fetches the weather, retrying transient failures with a doubling
    /// delay. Returns `None` once the enrichment is given up on.
    fn fetch_weather(&self, timestamp: &DateTime<Local>) -> Option<Weather> {
        let mut delay = self.retry_delay;
        for attempt in 0..=self.retries {
            match self.provider.fetch_weather() {
                Ok(weather) => return Some(weather),
                Err(error) if error.is_transient() && attempt < self.retries => {
                    warn!("Weather attempt #{} failed: {}. Retrying in {:?}…", attempt + 1, error, delay);
                    std::thread::sleep(delay);
                    delay *= 2;
                }
                Err(error) => {
                    error!("Weather enrichment failed: {}.", error);
                    self.journal(timestamp, "weather", &error);
                    return None;
                }
            }
        }
        None
    }

    /// Best effort: a failing journal must not mask the tick outcome.
    fn journal(&self, timestamp: &DateTime<Local>, stage: &str, error: &dyn std::fmt::Display) {
        if let Err(journal_error) = self.db.insert_error(timestamp, stage, &error.to_string()) {
            warn!("Could not journal the `{}` error: {}.", stage, journal_error);
        }
    }
}
