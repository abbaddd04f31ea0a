use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaValidationError {
    #[error("media URI cannot be empty")]
    EmptyMediaUri,

    #[error("media URI is not a valid URL: {raw}")]
    InvalidUrl { raw: String },

    #[error("media URI must use http or https: {scheme}")]
    UnsupportedScheme { scheme: String },
}

/// A validated link to question/option media (currently images only).
///
/// Definitions arrive from the catalog with raw string URLs; validating at
/// the model boundary keeps every downstream renderer free of URL checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUri(Url);

impl MediaUri {
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, MediaValidationError> {
        let raw = url.as_ref().trim();
        if raw.is_empty() {
            return Err(MediaValidationError::EmptyMediaUri);
        }
        let parsed = Url::parse(raw).map_err(|_| MediaValidationError::InvalidUrl {
            raw: raw.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self(parsed)),
            other => Err(MediaValidationError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
