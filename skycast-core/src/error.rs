use reqwest::StatusCode;

/// Failure taxonomy of the weather provider boundary.
///
/// Every transport or provider failure is classified into one of these
/// variants before it leaves the provider client; callers never see a raw
/// `reqwest::Error`.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("no city matched the query")]
    CityNotFound,

    #[error("provider request quota exhausted")]
    RateLimited,

    #[error("provider returned an unexpected response (status {status}): {detail}")]
    Provider { status: StatusCode, detail: String },

    #[error("request never reached the provider")]
    Network(#[source] reqwest::Error),
}

impl WeatherError {
    /// Map a failed provider status code to the taxonomy.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => WeatherError::CityNotFound,
            StatusCode::TOO_MANY_REQUESTS => WeatherError::RateLimited,
            _ => WeatherError::Provider { status, detail: truncate_body(body) },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::CityNotFound => ErrorKind::CityNotFound,
            WeatherError::RateLimited => ErrorKind::ApiRateLimit,
            WeatherError::Provider { .. } => ErrorKind::ApiError,
            WeatherError::Network(_) => ErrorKind::NetworkError,
        }
    }
}

/// User-facing error classification exposed by the query controller.
///
/// The string forms are stable identifiers the presentation layer keys its
/// localized error messages on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CityNotFound,
    ApiRateLimit,
    ApiError,
    NetworkError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CityNotFound => "cityNotFound",
            ErrorKind::ApiRateLimit => "apiRateLimit",
            ErrorKind::ApiError => "apiError",
            ErrorKind::NetworkError => "networkError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
