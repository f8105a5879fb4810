//! Seams between the collection pipeline and its external collaborators.

use std::time::Duration;

use lazy_static::lazy_static;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use structopt::clap::crate_version;

use crate::error::{SourceError, WeatherError};
use crate::prelude::*;

pub mod facility;
pub mod openweather;

pub const USER_AGENT: &str = concat!(
    "gymlog / ",
    crate_version!(),
    " (Rust; https://github.com/eigenein/gymlog)"
);

lazy_static! {
    /// `Client` instance used to make requests to all services.
    pub static ref CLIENT: Client = build_client().expect("Failed to build an HTTP client");
}

/// Builds the shared HTTP client. The timeout bounds every outbound call so
/// one tick cannot stall into the next one.
fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    Ok(Client::builder()
        .gzip(true)
        .use_rustls_tls()
        .default_headers(headers)
        .timeout(Duration::from_secs(10))
        .build()?)
}

/// Produces the current occupancy count.
pub trait OccupancySource {
    fn read_occupancy(&self) -> Result<u32, SourceError>;
}

/// Produces the current weather for the configured location.
pub trait WeatherProvider {
    fn fetch_weather(&self) -> Result<Weather, WeatherError>;
}

/// What the weather enrichment adds to a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weather {
    /// Degrees in the configured unit system.
    pub temperature: f64,

    /// Rain over the last hour, mm.
    pub precipitation: f64,
}
