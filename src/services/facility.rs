//! Facility-occupancy page source.
//!
//! The occupancy page renders one section per facility; each section carries
//! an occupancy chart whose `data-ratio` attribute holds the current load as
//! a 0–1 fraction.

use regex::Regex;

use crate::error::SourceError;
use crate::services::{OccupancySource, CLIENT};
use crate::settings::FacilitySettings;
use crate::prelude::*;

pub struct Facility {
    url: String,
    id: String,
    section_regex: Regex,
    ratio_regex: Regex,
}

impl Facility {
    pub fn new(settings: &FacilitySettings) -> Result<Self> {
        Ok(Self {
            url: settings.url.clone(),
            id: settings.id.clone(),
            section_regex: Regex::new(&format!(r#"id="{}""#, regex::escape(&settings.id)))?,
            ratio_regex: Regex::new(r#"data-ratio="([^"]*)""#)?,
        })
    }

    /// Extracts the percentage from the page body: finds the facility section
    /// by its element id and takes the first chart ratio after it.
    fn extract(&self, body: &str) -> Result<u32, SourceError> {
        let section_start = self
            .section_regex
            .find(body)
            .ok_or_else(|| SourceError::FacilityMissing(self.id.clone()))?
            .end();
        let captures = self
            .ratio_regex
            .captures(&body[section_start..])
            .ok_or_else(|| SourceError::FacilityMissing(self.id.clone()))?;
        let ratio: f64 = captures[1]
            .parse()
            .map_err(|_| SourceError::InvalidValue(captures[1].to_string()))?;
        let percent = (ratio * 100.0).round();
        if !(0.0..=100.0).contains(&percent) {
            return Err(SourceError::InvalidValue(percent.to_string()));
        }
        Ok(percent as u32)
    }
}

impl OccupancySource for Facility {
    fn read_occupancy(&self) -> Result<u32, SourceError> {
        debug!("Fetching {}…", self.url);
        let body = CLIENT
            .get(&self.url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(SourceError::Unreachable)?
            .text()
            .map_err(SourceError::Unreachable)?;
        self.extract(&body)
    }
}
