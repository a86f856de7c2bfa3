use crate::{
    error::WeatherError,
    model::{CitySuggestion, Language, WeatherSnapshot},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Seam between the query/search flows and the actual weather backend.
///
/// Production uses [`openweather::OpenWeatherProvider`]; tests substitute a
/// scripted implementation.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions for a city. One provider call, no retries.
    async fn current_weather(
        &self,
        city: &str,
        lang: Language,
    ) -> Result<WeatherSnapshot, WeatherError>;

    /// Search candidate cities by name prefix.
    ///
    /// Search is advisory: queries shorter than two characters return an empty
    /// list without touching the network, and any provider or transport
    /// failure degrades to an empty list instead of an error.
    async fn search_cities(&self, query: &str, limit: usize) -> Vec<CitySuggestion>;
}

/// Compass label for a wind bearing, bucketed into eight 45-degree sectors:
/// north covers 0..45, northeast 45..90, and so on clockwise.
///
/// Periodic in 360, so bearings outside 0..360 normalize first.
pub fn wind_direction(degrees: f64, lang: Language) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let index = (normalized / 45.0) as usize % 8;
    lang.compass_labels()[index]
}

/// Display icon for an OpenWeather icon code, with a fixed fallback for codes
/// the table does not know.
pub fn weather_icon(icon_code: &str) -> &'static str {
    match icon_code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" | "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "09n" | "10n" => "🌧️",
        "10d" => "🌦️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => "🌤️",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_direction_bucket_boundaries() {
        assert_eq!(wind_direction(0.0, Language::English), "N");
        assert_eq!(wind_direction(22.0, Language::English), "N");
        assert_eq!(wind_direction(44.0, Language::English), "N");
        assert_eq!(wind_direction(45.0, Language::English), "NE");
        assert_eq!(wind_direction(90.0, Language::English), "E");
        assert_eq!(wind_direction(315.0, Language::English), "NW");
        assert_eq!(wind_direction(359.0, Language::English), "NW");
    }

    #[test]
    fn wind_direction_is_periodic() {
        for deg in [0.0, 44.0, 45.0, 123.0, 359.0] {
            for k in [-2.0, -1.0, 1.0, 3.0] {
                assert_eq!(
                    wind_direction(deg, Language::English),
                    wind_direction(deg + 360.0 * k, Language::English),
                    "deg={deg} k={k}"
                );
            }
        }
    }

    #[test]
    fn wind_direction_localized() {
        assert_eq!(wind_direction(0.0, Language::ChineseTraditional), "北");
        assert_eq!(wind_direction(45.0, Language::ChineseTraditional), "東北");
        assert_eq!(wind_direction(180.0, Language::ChineseTraditional), "南");
    }

    #[test]
    fn icon_lookup_with_fallback() {
        assert_eq!(weather_icon("01d"), "☀️");
        assert_eq!(weather_icon("10d"), "🌦️");
        assert_eq!(weather_icon("13n"), "❄️");
        assert_eq!(weather_icon("??"), "🌤️");
        assert_eq!(weather_icon(""), "🌤️");
    }
}
