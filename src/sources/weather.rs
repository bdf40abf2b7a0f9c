//! OpenWeather One Call weather fetcher.
//!
//! Weather is supplementary: [`fetch_weather`] always returns a [`Weather`]
//! value, using [`Weather::Unavailable`] when the key is missing or the
//! request fails, so the dashboard renders either way.

use crate::error::SourceError;
use crate::models::{CurrentConditions, ForecastDay, Units, Weather, WeatherSummary};
use crate::sources::get_text;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Default One Call endpoint.
pub const ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Number of forecast days shown on the dashboard.
pub const FORECAST_DAYS: usize = 5;

/// Where and how to ask for the weather.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSettings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub lat: f64,
    pub lon: f64,
    pub units: Units,
    /// Display name; defaults to the timezone name from the response.
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OneCall {
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    timezone_offset: i32,
    current: ApiCurrent,
    #[serde(default)]
    daily: Vec<ApiDaily>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiCondition {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    dt: i64,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: u32,
    #[serde(default)]
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<ApiCondition>,
}

#[derive(Debug, Deserialize)]
struct ApiTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct ApiDaily {
    dt: i64,
    temp: ApiTemp,
    #[serde(default)]
    weather: Vec<ApiCondition>,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    rain: f64,
    #[serde(default)]
    snow: f64,
}

/// Fetch current conditions and the forecast.
///
/// Never fails: a missing key or any HTTP/JSON error yields
/// [`Weather::Unavailable`].
#[instrument(level = "info", skip_all, fields(lat = settings.lat, lon = settings.lon))]
pub async fn fetch_weather(client: &Client, settings: &WeatherSettings) -> Weather {
    let Some(api_key) = settings.api_key.as_deref() else {
        info!("No weather API key configured; skipping weather");
        return Weather::unavailable("not configured");
    };

    match fetch_summary(client, settings, api_key).await {
        Ok(summary) => {
            info!(location = %summary.location, days = summary.forecast.len(), "Fetched weather");
            Weather::Available(summary)
        }
        Err(e) => {
            warn!(error = %e, "Weather fetch failed; rendering without it");
            Weather::unavailable(e.to_string())
        }
    }
}

async fn fetch_summary(
    client: &Client,
    settings: &WeatherSettings,
    api_key: &str,
) -> Result<WeatherSummary, SourceError> {
    let lat = settings.lat.to_string();
    let lon = settings.lon.to_string();
    let query = [
        ("lat", lat.as_str()),
        ("lon", lon.as_str()),
        ("appid", api_key),
        ("units", settings.units.as_param()),
        ("exclude", "minutely,alerts"),
    ];
    let body = get_text(client, &settings.endpoint, &query).await?;
    parse_weather(&body, settings.units, settings.location.as_deref())
}

/// Parse a One Call response into a [`WeatherSummary`].
///
/// Timestamps are shown in the location's own zone, from `timezone_offset`.
pub fn parse_weather(
    body: &str,
    units: Units,
    location: Option<&str>,
) -> Result<WeatherSummary, SourceError> {
    let raw: OneCall = serde_json::from_str(body)?;
    let offset = FixedOffset::east_opt(raw.timezone_offset).unwrap_or(Utc.fix());
    let local = |ts: i64| -> DateTime<FixedOffset> {
        DateTime::<Utc>::from_timestamp(ts, 0)
            .unwrap_or_default()
            .with_timezone(&offset)
    };

    let condition = raw.current.weather.into_iter().next().unwrap_or_default();
    let current = CurrentConditions {
        observed_at: local(raw.current.dt).format("%Y-%m-%d %H:%M").to_string(),
        temp: raw.current.temp,
        feels_like: raw.current.feels_like,
        humidity: raw.current.humidity,
        wind_speed: raw.current.wind_speed,
        main: condition.main,
        description: condition.description,
        sunrise: local(raw.current.sunrise).format("%H:%M").to_string(),
        sunset: local(raw.current.sunset).format("%H:%M").to_string(),
    };

    let forecast = raw
        .daily
        .into_iter()
        .take(FORECAST_DAYS)
        .map(|day| {
            let when = local(day.dt);
            let condition = day.weather.into_iter().next().unwrap_or_default();
            ForecastDay {
                date: when.format("%Y-%m-%d").to_string(),
                day_name: when.format("%A").to_string(),
                main: condition.main,
                description: condition.description,
                temp_min: day.temp.min,
                temp_max: day.temp.max,
                pop: day.pop,
                rain: day.rain,
                snow: day.snow,
            }
        })
        .collect();

    let location = location
        .map(str::to_string)
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(raw.timezone);

    Ok(WeatherSummary {
        location,
        units,
        current,
        forecast,
    })
}
