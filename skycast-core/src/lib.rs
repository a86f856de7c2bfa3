//! Core library for the `skycast` weather lookup app.
//!
//! This crate defines:
//! - Configuration & persisted user preferences
//! - The weather provider client (OpenWeather) and its error taxonomy
//! - The cached weather query controller
//! - The debounced city suggestion flow
//!
//! It is used by `skycast-cli`, but can also be reused by other front ends.

pub mod config;
pub mod debounce;
pub mod error;
pub mod model;
pub mod provider;
pub mod query;
pub mod suggest;

pub use config::Config;
pub use error::{ErrorKind, WeatherError};
pub use model::{CitySuggestion, Language, POPULAR_CITIES, WeatherSnapshot};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use query::{QueryPhase, QueryState, ServeSource, WeatherQuery};
pub use suggest::CitySearch;
