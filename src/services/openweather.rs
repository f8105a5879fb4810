//! OpenWeather current-weather provider.
//!
//! <https://openweathermap.org/current>

use reqwest::StatusCode;

use crate::error::WeatherError;
use crate::prelude::*;
use crate::services::{Weather, WeatherProvider, CLIENT};
use crate::settings::WeatherSettings;

const URL: &str = "https://api.openweathermap.org/data/2.5/weather";

pub struct OpenWeather {
    settings: WeatherSettings,
}

impl OpenWeather {
    pub fn new(settings: WeatherSettings) -> Self {
        Self { settings }
    }
}

impl WeatherProvider for OpenWeather {
    fn fetch_weather(&self) -> Result<Weather, WeatherError> {
        debug!("Calling {}…", URL);
        let response = CLIENT
            .get(URL)
            .query(&[
                ("units", self.settings.units.as_query_value().to_string()),
                ("lat", self.settings.latitude.to_string()),
                ("lon", self.settings.longitude.to_string()),
                ("appid", self.settings.api_key.clone()),
            ])
            .send()
            .map_err(WeatherError::Network)?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(WeatherError::Authentication),
            StatusCode::TOO_MANY_REQUESTS => return Err(WeatherError::RateLimited),
            status if !status.is_success() => return Err(WeatherError::Status(status)),
            _ => {}
        }
        Ok(response.json::<Response>().map_err(WeatherError::Malformed)?.into())
    }
}

#[derive(Deserialize)]
struct Response {
    main: ResponseMain,

    /// Absent when there was no rain.
    #[serde(default)]
    rain: ResponseRain,
}

#[derive(Deserialize)]
struct ResponseMain {
    #[serde(rename = "temp")]
    temperature: f64,
}

#[derive(Deserialize, Default)]
struct ResponseRain {
    /// Rain volume for the last 1 hour, mm.
    #[serde(rename = "1h", default)]
    last_hour: f64,
}

impl From<Response> for Weather {
    fn from(response: Response) -> Self {
        Self {
            temperature: response.main.temperature,
            precipitation: response.rain.last_hour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_without_rain() -> Result {
        let response = serde_json::from_str::<Response>(
            r#"{"coord":{"lon":4.66,"lat":52.36},"weather":[{"id":801,"main":"Clouds","description":"few clouds","icon":"02d"}],"base":"stations","main":{"temp":19.47,"feels_like":14.2,"temp_min":18.33,"temp_max":20,"pressure":1010,"humidity":60},"visibility":10000,"wind":{"speed":8.2,"deg":260},"clouds":{"all":20},"dt":1593698008,"sys":{"type":1,"id":1524,"country":"NL","sunrise":1593660273,"sunset":1593720364},"timezone":7200,"id":2747702,"name":"Schalkwijk","cod":200}"#,
        )?;
        let weather = Weather::from(response);
        assert_eq!(weather.temperature, 19.47);
        assert_eq!(weather.precipitation, 0.0);
        Ok(())
    }

    #[test]
    fn parse_with_rain() -> Result {
        let response = serde_json::from_str::<Response>(
            r#"{"coord":{"lon":37.62,"lat":55.76},"weather":[{"id":503,"main":"Rain","description":"very heavy rain","icon":"10d"}],"base":"stations","main":{"temp":22.38,"feels_like":20.92,"temp_min":20.56,"temp_max":25,"pressure":1011,"humidity":60},"visibility":10000,"wind":{"speed":4,"deg":190},"rain":{"1h":44.96},"clouds":{"all":40},"dt":1593699165,"sys":{"type":1,"id":9027,"country":"RU","sunrise":1593651041,"sunset":1593713773},"timezone":10800,"id":524925,"name":"Moscow Oblast","cod":200}"#,
        )?;
        let weather = Weather::from(response);
        assert_eq!(weather.temperature, 22.38);
        assert_eq!(weather.precipitation, 44.96);
        Ok(())
    }

    #[test]
    fn rain_without_hourly_volume_defaults_to_zero() -> Result {
        let response = serde_json::from_str::<Response>(r#"{"main":{"temp":1.0},"rain":{"3h":2.5}}"#)?;
        assert_eq!(Weather::from(response).precipitation, 0.0);
        Ok(())
    }

    #[test]
    fn transient_and_permanent_kinds() {
        assert!(WeatherError::RateLimited.is_transient());
        assert!(WeatherError::Status(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!WeatherError::Authentication.is_transient());
        assert!(!WeatherError::Status(StatusCode::BAD_REQUEST).is_transient());
    }
}
