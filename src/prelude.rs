pub use crate::db::Db;
pub use crate::error::{SourceError, StorageError, TickError, WeatherError};
pub use crate::reading::Reading;
pub use crate::settings::Settings;
pub use anyhow::{anyhow, Context};
pub use chrono::prelude::*;
pub use log::{debug, error, info, warn};
pub use serde::Deserialize;

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
