//! # Settings
//!
//! `gymlog` is configured with a single TOML file.
//!
//! ## Example
//!
//! ```toml
//! [facility]
//! url = "https://fitrec.example.edu/FacilityOccupancy"
//! id = "facility-f8636073-d75d-4aa3-bf30-cdc01946899b"
//!
//! [weather]
//! latitude = 42.337
//! longitude = -71.092
//! units = "metric"
//! api_key = "0123456789abcdef"
//!
//! [hours]
//! mon = { open = "06:00", close = "23:00" }
//! tue = { open = "06:00", close = "23:00" }
//! wed = { open = "06:00", close = "23:00" }
//! thu = { open = "06:00", close = "23:00" }
//! fri = { open = "06:00", close = "21:00" }
//! sat = { open = "11:00", close = "19:00" }
//! sun = { open = "11:00", close = "21:00" }
//! ```
//!
//! The `OPENWEATHER_API_KEY` environment variable, when set, overrides
//! `weather.api_key`. Omitting `[hours]` altogether means the facility is
//! always open; a weekday missing from the table is closed the whole day.

use std::path::Path;

use chrono::Duration;
use serde::Deserializer;

use crate::prelude::*;

/// Reads, overrides and validates the settings file.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let mut settings: Settings = toml::from_str(
        &std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?,
    )
    .with_context(|| format!("failed to parse `{}`", path.display()))?;
    if let Ok(api_key) = std::env::var("OPENWEATHER_API_KEY") {
        settings.weather.api_key = api_key;
    }
    settings.validate()?;
    Ok(settings)
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub facility: FacilitySettings,

    pub weather: WeatherSettings,

    /// Operating hours per weekday. Absent means always open.
    #[serde(default)]
    pub hours: Option<OperatingHours>,
}

impl Settings {
    pub fn validate(&self) -> Result {
        if !self.facility.url.starts_with("http://") && !self.facility.url.starts_with("https://") {
            return Err(anyhow!("`facility.url` is not an HTTP(S) URL: `{}`", self.facility.url));
        }
        if self.facility.id.is_empty() {
            return Err(anyhow!("`facility.id` must not be empty"));
        }
        if self.weather.api_key.is_empty() {
            return Err(anyhow!(
                "the weather API key is missing, set `weather.api_key` or `OPENWEATHER_API_KEY`"
            ));
        }
        if !(-90.0..=90.0).contains(&self.weather.latitude) {
            return Err(anyhow!("`weather.latitude` is out of range: {}", self.weather.latitude));
        }
        if !(-180.0..=180.0).contains(&self.weather.longitude) {
            return Err(anyhow!("`weather.longitude` is out of range: {}", self.weather.longitude));
        }
        if let Some(hours) = &self.hours {
            hours.validate()?;
        }
        Ok(())
    }
}

/// Where the occupancy count comes from.
#[derive(Deserialize, Debug, Clone)]
pub struct FacilitySettings {
    /// Facility-occupancy page URL.
    pub url: String,

    /// Element `id` of the facility section on the page.
    pub id: String,
}

/// Which location the weather is fetched for and how.
#[derive(Deserialize, Debug, Clone)]
pub struct WeatherSettings {
    /// Latitude, WGS84 decimal degrees.
    pub latitude: f64,

    /// Longitude, WGS84 decimal degrees.
    pub longitude: f64,

    #[serde(default)]
    pub units: Units,

    /// Overridden by `OPENWEATHER_API_KEY` when the variable is set.
    #[serde(default)]
    pub api_key: String,

    /// Additional attempts after a transient failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay before the first retry, doubled on each further one.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

const fn default_retries() -> u32 {
    2
}

const fn default_retry_delay_secs() -> u64 {
    2
}

/// Unit system of the stored temperature.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Default for Units {
    fn default() -> Self {
        Units::Metric
    }
}

impl Units {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

/// Open and close times per weekday.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct OperatingHours {
    pub mon: Option<DayHours>,
    pub tue: Option<DayHours>,
    pub wed: Option<DayHours>,
    pub thu: Option<DayHours>,
    pub fri: Option<DayHours>,
    pub sat: Option<DayHours>,
    pub sun: Option<DayHours>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DayHours {
    #[serde(deserialize_with = "deserialize_hour_minute")]
    pub open: NaiveTime,

    #[serde(deserialize_with = "deserialize_hour_minute")]
    pub close: NaiveTime,
}

impl OperatingHours {
    pub fn on(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Mon => self.mon.as_ref(),
            Weekday::Tue => self.tue.as_ref(),
            Weekday::Wed => self.wed.as_ref(),
            Weekday::Thu => self.thu.as_ref(),
            Weekday::Fri => self.fri.as_ref(),
            Weekday::Sat => self.sat.as_ref(),
            Weekday::Sun => self.sun.as_ref(),
        }
    }

    pub fn is_open_at(&self, timestamp: &DateTime<Local>) -> bool {
        self.on(timestamp.weekday())
            .map_or(false, |day| day.open <= timestamp.time() && timestamp.time() <= day.close)
    }

    /// The first opening time strictly after the given moment, if there is
    /// one within the week.
    pub fn next_opening(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        for days_ahead in 0..=7 {
            let date = after.date_naive() + Duration::days(days_ahead);
            if let Some(day) = self.on(date.weekday()) {
                if let Some(opening) = Local.from_local_datetime(&date.and_time(day.open)).single() {
                    if opening > *after {
                        return Some(opening);
                    }
                }
            }
        }
        None
    }

    fn validate(&self) -> Result {
        for (weekday, day) in [
            ("mon", &self.mon),
            ("tue", &self.tue),
            ("wed", &self.wed),
            ("thu", &self.thu),
            ("fri", &self.fri),
            ("sat", &self.sat),
            ("sun", &self.sun),
        ]
        .iter()
        {
            if let Some(day) = day {
                if day.open >= day.close {
                    return Err(anyhow!(
                        "`hours.{}` opens at {} but closes at {}",
                        weekday,
                        day.open,
                        day.close
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Deserializes an `%H:%M` time.
fn deserialize_hour_minute<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<NaiveTime, D::Error> {
    NaiveTime::parse_from_str(&String::deserialize(deserializer)?, "%H:%M").map_err(serde::de::Error::custom)
}
