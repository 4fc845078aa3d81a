use reqwest::StatusCode;

pub(crate) type DcatqaResult<T> = Result<T, DcatqaError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(DcatqaError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum DcatqaError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint responded with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("invalid response for `{metric}`: {message}")]
    Parse { metric: String, message: String },

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("{0}")]
    Other(String),
}

impl DcatqaError {
    #[inline]
    pub(crate) fn parse<S: ToString, T: ToString>(
        metric: S,
        message: T,
    ) -> Self {
        Self::Parse {
            metric: metric.to_string(),
            message: message.to_string(),
        }
    }

    #[inline]
    pub(crate) fn schema<T: ToString>(s: T) -> Self {
        Self::Schema(s.to_string())
    }
}
