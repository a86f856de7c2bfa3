use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UI language of the application.
///
/// OpenWeather expects its own language tags, so each variant carries a fixed
/// mapping from the internal tag (`en`, `zh-TW`) to the provider tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    English,
    #[default]
    ChineseTraditional,
}

impl Language {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::ChineseTraditional => "zh-TW",
        }
    }

    /// Tag understood by the weather provider.
    pub fn api_code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::ChineseTraditional => "zh_tw",
        }
    }

    /// Compass labels for the eight 45-degree wind sectors, starting at north
    /// and going clockwise.
    pub fn compass_labels(&self) -> &'static [&'static str; 8] {
        match self {
            Language::English => &["N", "NE", "E", "SE", "S", "SW", "W", "NW"],
            Language::ChineseTraditional => {
                &["北", "東北", "東", "東南", "南", "西南", "西", "西北"]
            }
        }
    }

    pub const fn all() -> &'static [Language] {
        &[Language::English, Language::ChineseTraditional]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl TryFrom<&str> for Language {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "en" => Ok(Language::English),
            "zh-TW" | "zh_tw" => Ok(Language::ChineseTraditional),
            _ => Err(anyhow::anyhow!(
                "Unknown language '{value}'. Supported languages: en, zh-TW."
            )),
        }
    }
}

/// Canonical weather result for one city at one observation time.
///
/// Constructed fresh on every successful provider fetch and never mutated; a
/// newer fetch for the same key supersedes the old snapshot wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub wind_direction: String,
    pub description: String,
    pub icon: String,
    pub icon_code: String,
    pub observation_time: DateTime<Utc>,
}

/// Candidate city returned by search. Ephemeral: regenerated on every search
/// call and never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub id: u64,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// A well-known city offered when the user has not typed anything yet.
#[derive(Debug, Clone, Copy)]
pub struct PopularCity {
    pub name: &'static str,
    pub flag: &'static str,
    pub display_zh: &'static str,
    pub display_en: &'static str,
}

impl PopularCity {
    pub fn display_name(&self, lang: Language) -> &'static str {
        match lang {
            Language::English => self.display_en,
            Language::ChineseTraditional => self.display_zh,
        }
    }
}

pub const POPULAR_CITIES: &[PopularCity] = &[
    PopularCity { name: "Taipei", flag: "🇹🇼", display_zh: "台北", display_en: "Taipei" },
    PopularCity { name: "Tokyo", flag: "🇯🇵", display_zh: "東京", display_en: "Tokyo" },
    PopularCity { name: "New York", flag: "🇺🇸", display_zh: "紐約", display_en: "New York" },
    PopularCity { name: "London", flag: "🇬🇧", display_zh: "倫敦", display_en: "London" },
    PopularCity { name: "Paris", flag: "🇫🇷", display_zh: "巴黎", display_en: "Paris" },
    PopularCity { name: "Sydney", flag: "🇦🇺", display_zh: "雪梨", display_en: "Sydney" },
    PopularCity { name: "Singapore", flag: "🇸🇬", display_zh: "新加坡", display_en: "Singapore" },
    PopularCity { name: "Seoul", flag: "🇰🇷", display_zh: "首爾", display_en: "Seoul" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_tag_roundtrip() {
        for lang in Language::all() {
            let parsed = Language::try_from(lang.as_tag()).expect("roundtrip should succeed");
            assert_eq!(*lang, parsed);
        }
    }

    #[test]
    fn provider_code_mapping() {
        assert_eq!(Language::English.api_code(), "en");
        assert_eq!(Language::ChineseTraditional.api_code(), "zh_tw");
    }

    #[test]
    fn unknown_language_errors() {
        let err = Language::try_from("fr").unwrap_err();
        assert!(err.to_string().contains("Unknown language"));
    }

    #[test]
    fn popular_city_display_follows_language() {
        let taipei = &POPULAR_CITIES[0];
        assert_eq!(taipei.display_name(Language::ChineseTraditional), "台北");
        assert_eq!(taipei.display_name(Language::English), "Taipei");
    }
}
