use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use skycast_core::{
    Config, ErrorKind, Language, OpenWeatherProvider, POPULAR_CITIES, QueryPhase, WeatherProvider,
    WeatherQuery, WeatherSnapshot, suggest::SUGGESTION_LIMIT,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "City weather lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred language.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name; if absent, the last searched city is used.
        city: Option<String>,

        /// UI language tag, e.g. "en" or "zh-TW".
        #[arg(long)]
        lang: Option<String>,
    },

    /// Search for a city by name and show its weather.
    Search {
        /// Search text, at least two characters.
        query: String,

        #[arg(long)]
        lang: Option<String>,
    },

    /// Pick one of the popular cities and show its weather.
    Cities {
        #[arg(long)]
        lang: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lang } => show(city, lang.as_deref()).await,
            Command::Search { query, lang } => search(&query, lang.as_deref()).await,
            Command::Cities { lang } => cities(lang.as_deref()).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    cfg.api_key = Some(key);

    let tag = inquire::Select::new("Preferred language:", vec!["zh-TW", "en"])
        .prompt()
        .context("Failed to read language choice")?;
    cfg.set_language(Language::try_from(tag)?);

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>, lang_flag: Option<&str>) -> Result<()> {
    let mut cfg = Config::load()?;
    let lang = resolve_language(&cfg, lang_flag)?;
    let city = city.unwrap_or_else(|| cfg.startup_city().to_string());

    lookup_and_print(&mut cfg, &city, lang, lang_flag.is_some()).await
}

async fn search(query: &str, lang_flag: Option<&str>) -> Result<()> {
    let mut cfg = Config::load()?;
    let lang = resolve_language(&cfg, lang_flag)?;
    let provider = provider_from_config(&cfg)?;

    let suggestions = provider.search_cities(query, SUGGESTION_LIMIT).await;
    if suggestions.is_empty() {
        println!("No matching cities for '{query}'.");
        return Ok(());
    }

    let options: Vec<String> = suggestions
        .iter()
        .map(|s| format!("{}, {}", s.name, s.country))
        .collect();
    let picked = inquire::Select::new("Pick a city:", options)
        .prompt()
        .context("Failed to read city choice")?;
    let city = suggestions
        .iter()
        .find(|s| format!("{}, {}", s.name, s.country) == picked)
        .map(|s| s.name.clone())
        .context("Selected city was not among the suggestions")?;

    lookup_and_print(&mut cfg, &city, lang, lang_flag.is_some()).await
}

async fn cities(lang_flag: Option<&str>) -> Result<()> {
    let mut cfg = Config::load()?;
    let lang = resolve_language(&cfg, lang_flag)?;

    let options: Vec<String> = POPULAR_CITIES
        .iter()
        .map(|c| format!("{} {}", c.flag, c.display_name(lang)))
        .collect();
    let picked = inquire::Select::new("Pick a city:", options)
        .prompt()
        .context("Failed to read city choice")?;
    let city = POPULAR_CITIES
        .iter()
        .find(|c| format!("{} {}", c.flag, c.display_name(lang)) == picked)
        .map(|c| c.name.to_string())
        .context("Selected city was not among the popular cities")?;

    lookup_and_print(&mut cfg, &city, lang, lang_flag.is_some()).await
}

async fn lookup_and_print(
    cfg: &mut Config,
    city: &str,
    lang: Language,
    persist_lang: bool,
) -> Result<()> {
    let provider = provider_from_config(cfg)?;
    let query = WeatherQuery::new(provider);

    query.lookup(city, lang).await;
    let state = query.state();

    match state.phase {
        QueryPhase::Served(_) => {
            let snapshot = state
                .result
                .context("Served state carried no weather snapshot")?;
            print_snapshot(&snapshot);

            cfg.remember_city(city);
            if persist_lang {
                cfg.set_language(lang);
            }
            cfg.save()?;
            Ok(())
        }
        QueryPhase::Failed(kind) => bail!("{}", describe_failure(kind, city)),
        QueryPhase::Idle | QueryPhase::Loading => bail!("Weather lookup did not settle"),
    }
}

fn provider_from_config(cfg: &Config) -> Result<Arc<OpenWeatherProvider>> {
    let api_key = cfg.require_api_key()?.to_string();
    Ok(Arc::new(OpenWeatherProvider::new(api_key, cfg.base_url.clone())))
}

fn resolve_language(cfg: &Config, flag: Option<&str>) -> Result<Language> {
    match flag {
        Some(tag) => Language::try_from(tag),
        None => Ok(cfg.preferred_language()),
    }
}

fn print_snapshot(snap: &WeatherSnapshot) {
    println!("{} {}, {} ({})", snap.icon, snap.city, snap.country, snap.description);
    println!(
        "  Temperature: {:.1}°C (feels like {:.1}°C, range {:.1}–{:.1}°C)",
        snap.temp_c, snap.feels_like_c, snap.temp_min_c, snap.temp_max_c
    );
    println!(
        "  Humidity: {}%   Pressure: {} hPa",
        snap.humidity_pct, snap.pressure_hpa
    );
    println!(
        "  Wind: {:.1} m/s {}",
        snap.wind_speed_mps, snap.wind_direction
    );
    println!(
        "  Observed: {}",
        snap.observation_time.format("%Y-%m-%d %H:%M UTC")
    );
}

fn describe_failure(kind: ErrorKind, city: &str) -> String {
    match kind {
        ErrorKind::CityNotFound => format!("No city matched '{city}'."),
        ErrorKind::ApiRateLimit => {
            "The weather service request quota is exhausted. Try again later.".to_string()
        }
        ErrorKind::ApiError => "The weather service returned an unexpected response.".to_string(),
        ErrorKind::NetworkError => {
            "Could not reach the weather service. Check your connection and retry.".to_string()
        }
    }
}
