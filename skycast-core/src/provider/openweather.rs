use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::WeatherError,
    model::{CitySuggestion, Language, WeatherSnapshot},
};

use super::{WeatherProvider, weather_icon, wind_direction};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Bound on every provider call so the controller's loading state cannot hang
/// forever; an elapsed timeout classifies as a network failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    async fn fetch_current(
        &self,
        city: &str,
        lang: Language,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("q", city),
                ("lang", lang.api_code()),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(WeatherError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Network)?;

        if !status.is_success() {
            return Err(WeatherError::from_status(status, &body));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::Provider { status, detail: format!("malformed current-weather payload: {e}") }
        })?;

        Ok(snapshot_from_current(parsed, lang))
    }

    async fn fetch_matches(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CitySuggestion>, WeatherError> {
        let url = format!("{}/find", self.base_url);

        let res = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("q", query),
                ("limit", limit.to_string().as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(WeatherError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Network)?;

        if !status.is_success() {
            return Err(WeatherError::from_status(status, &body));
        }

        let parsed: OwFindResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::Provider { status, detail: format!("malformed city-search payload: {e}") }
        })?;

        Ok(parsed
            .list
            .into_iter()
            .map(|city| CitySuggestion {
                id: city.id,
                name: city.name,
                country: city.sys.country,
                lat: city.coord.lat,
                lon: city.coord.lon,
            })
            .collect())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(
        &self,
        city: &str,
        lang: Language,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_current(city, lang).await
    }

    async fn search_cities(&self, query: &str, limit: usize) -> Vec<CitySuggestion> {
        if query.chars().count() < 2 {
            return Vec::new();
        }

        match self.fetch_matches(query, limit).await {
            Ok(cities) => cities,
            Err(err) => {
                tracing::warn!(query, %err, "city search failed, degrading to empty list");
                Vec::new()
            }
        }
    }
}

fn snapshot_from_current(parsed: OwCurrentResponse, lang: Language) -> WeatherSnapshot {
    let observation_time = DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now);

    let (description, icon_code) = parsed
        .weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

    WeatherSnapshot {
        city: parsed.name,
        country: parsed.sys.country,
        temp_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        temp_min_c: parsed.main.temp_min,
        temp_max_c: parsed.main.temp_max,
        humidity_pct: parsed.main.humidity,
        pressure_hpa: parsed.main.pressure,
        wind_speed_mps: parsed.wind.speed,
        wind_direction: wind_direction(parsed.wind.deg, lang).to_string(),
        description,
        icon: weather_icon(&icon_code).to_string(),
        icon_code,
        observation_time,
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwFindCity {
    id: u64,
    name: String,
    sys: OwSys,
    coord: OwCoord,
}

#[derive(Debug, Deserialize)]
struct OwFindResponse {
    list: Vec<OwFindCity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_JSON: &str = r#"{
        "name": "Taipei",
        "dt": 1717570800,
        "sys": { "country": "TW" },
        "main": {
            "temp": 28.3, "feels_like": 31.1,
            "temp_min": 26.0, "temp_max": 30.2,
            "humidity": 70, "pressure": 1008
        },
        "weather": [ { "description": "多雲", "icon": "03d" } ],
        "wind": { "speed": 4.2, "deg": 90 }
    }"#;

    #[test]
    fn current_payload_normalizes_into_snapshot() {
        let parsed: OwCurrentResponse = serde_json::from_str(CURRENT_JSON).unwrap();
        let snap = snapshot_from_current(parsed, Language::ChineseTraditional);

        assert_eq!(snap.city, "Taipei");
        assert_eq!(snap.country, "TW");
        assert_eq!(snap.temp_c, 28.3);
        assert_eq!(snap.humidity_pct, 70);
        assert_eq!(snap.pressure_hpa, 1008);
        assert_eq!(snap.wind_direction, "東");
        assert_eq!(snap.icon, "☁️");
        assert_eq!(snap.icon_code, "03d");
        assert_eq!(snap.observation_time.timestamp(), 1717570800);
    }

    #[test]
    fn missing_weather_entry_falls_back() {
        let json = r#"{
            "name": "Nowhere", "dt": 0,
            "sys": {},
            "main": {
                "temp": 1.0, "feels_like": 1.0,
                "temp_min": 0.0, "temp_max": 2.0,
                "humidity": 50, "pressure": 1000
            },
            "weather": [],
            "wind": { "speed": 0.0 }
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(json).unwrap();
        let snap = snapshot_from_current(parsed, Language::English);

        assert_eq!(snap.description, "Unknown");
        assert_eq!(snap.icon, "🌤️");
        assert_eq!(snap.wind_direction, "N");
    }

    #[test]
    fn find_payload_maps_to_suggestions() {
        let json = r#"{
            "list": [
                {
                    "id": 1668341,
                    "name": "Taipei",
                    "sys": { "country": "TW" },
                    "coord": { "lat": 25.05, "lon": 121.53 }
                },
                {
                    "id": 1668399,
                    "name": "Taichung",
                    "sys": { "country": "TW" },
                    "coord": { "lat": 24.14, "lon": 120.68 }
                }
            ]
        }"#;
        let parsed: OwFindResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.list.len(), 2);
        assert_eq!(parsed.list[0].id, 1668341);
        assert_eq!(parsed.list[1].name, "Taichung");
    }

    #[tokio::test]
    async fn short_query_skips_network_entirely() {
        // Unroutable base URL: a network attempt would fail loudly, a short
        // query must not even get that far.
        let provider = OpenWeatherProvider::new("KEY".into(), "http://127.0.0.1:1".into());
        assert!(provider.search_cities("a", 5).await.is_empty());
        assert!(provider.search_cities("", 5).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_provider_degrades_search_to_empty() {
        let provider = OpenWeatherProvider::new("KEY".into(), "http://127.0.0.1:1".into());
        assert!(provider.search_cities("Lon", 5).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_provider_classifies_as_network_error() {
        let provider = OpenWeatherProvider::new("KEY".into(), "http://127.0.0.1:1".into());
        let err = provider
            .current_weather("Taipei", Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Network(_)));
        assert_eq!(err.kind().as_str(), "networkError");
    }
}
