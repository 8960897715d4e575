//! Synthesis: the boundary to the external image-generation backend.
//!
//! DESIGN
//! ======
//! The backend is an opaque async function: a `RenderRequest` goes in, an
//! asset URL (usually a `data:` URI) comes out. `GenerationBackend` is the
//! trait seam; `genai::GenAiClient` is the HTTP implementation and tests
//! substitute scripted fakes.
//!
//! Rate limiting is the only failure that is retried (`retry::with_retry`,
//! exponential backoff). Every other failure is surfaced immediately.
//! Backend calls only ever produce derived render URLs; they never touch
//! the layer or animation model.

pub mod batch;
pub mod config;
pub mod genai;
pub mod prompt;
pub mod retry;

use serde::{Deserialize, Serialize};

pub use batch::{BrandKitKind, Progress, RenderPair, Synthesizer, VariantKind};
pub use retry::with_retry;

use crate::notice::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

/// Background theme of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn background(self) -> &'static str {
        match self {
            Self::Light => "#FFFFFF",
            Self::Dark => "#0F172A",
        }
    }

    #[must_use]
    pub fn text_color(self) -> &'static str {
        match self {
            Self::Light => "#1D2B3A",
            Self::Dark => "#F8FAFC",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// What a render request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Re-render the composition from its current layers.
    Recompose { theme: Theme },
    Variant { kind: VariantKind, theme: Theme },
    BrandKitAsset { kind: BrandKitKind },
}

impl Operation {
    /// Output aspect ratio requested from the backend.
    #[must_use]
    pub fn aspect_ratio(self) -> &'static str {
        match self {
            Self::Recompose { .. } | Self::Variant { .. } => "1:1",
            Self::BrandKitAsset { .. } => "16:9",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recompose { theme } => write!(f, "recompose:{}", theme.as_str()),
            Self::Variant { kind, theme } => write!(f, "variant:{}:{}", kind.as_str(), theme.as_str()),
            Self::BrandKitAsset { kind } => write!(f, "brand-kit:{}", kind.as_str()),
        }
    }
}

/// One call to the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub operation: Operation,
    /// Source image, as a data URI or bare base64 PNG.
    pub source_image: String,
    pub prompt: String,
}

/// Brand attributes every prompt draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandBrief {
    pub brand_name: String,
    #[serde(default)]
    pub slogan: String,
    pub style: String,
    pub primary_color: String,
}

// =============================================================================
// BACKEND SEAM
// =============================================================================

/// Produces rendered assets. Implemented over HTTP by `genai::GenAiClient`.
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Render one asset and return its URL.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::RateLimited`] for transient overload, other
    /// variants for request, response or content failures.
    async fn render(&self, request: &RenderRequest) -> Result<String, BackendError>;
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The backend signalled transient overload (HTTP 429 / `RESOURCE_EXHAUSTED`).
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The backend answered but returned no image.
    #[error("response contained no image asset")]
    NoAsset,

    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("config parse failed: {0}")]
    ConfigParse(String),
}

impl BackendError {
    /// Whether the backoff loop should retry this failure.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

impl ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => "E_RATE_LIMITED",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::NoAsset => "E_NO_ASSET",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::ApiRequest(_) | Self::ApiResponse { status: 500..=599, .. })
    }
}

/// Failure of a synthesis operation as seen by the editor.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    /// Another synthesis or batch is still outstanding.
    #[error("a synthesis is already in progress")]
    Busy,

    #[error("brand name is required")]
    MissingBrandName,

    #[error("no source image to render from")]
    MissingSource,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ErrorCode for SynthesisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy => "E_SYNTHESIS_BUSY",
            Self::MissingBrandName => "E_MISSING_BRAND_NAME",
            Self::MissingSource => "E_MISSING_SOURCE",
            Self::Backend(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Busy => true,
            Self::MissingBrandName | Self::MissingSource => false,
            Self::Backend(e) => e.retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_display_names_kind_and_theme() {
        let op = Operation::Variant { kind: VariantKind::Monochrome, theme: Theme::Dark };
        assert_eq!(op.to_string(), "variant:monochrome:dark");
        assert_eq!(op.aspect_ratio(), "1:1");
        assert_eq!(Operation::BrandKitAsset { kind: BrandKitKind::BusinessCard }.aspect_ratio(), "16:9");
    }

    #[test]
    fn only_rate_limits_are_retried_by_backoff() {
        assert!(BackendError::RateLimited("429".into()).is_rate_limited());
        assert!(!BackendError::ApiResponse { status: 503, body: String::new() }.is_rate_limited());
        assert!(BackendError::ApiResponse { status: 503, body: String::new() }.retryable());
        assert!(!BackendError::NoAsset.retryable());
    }

    #[test]
    fn synthesis_error_delegates_code() {
        let err = SynthesisError::from(BackendError::NoAsset);
        assert_eq!(err.error_code(), "E_NO_ASSET");
        assert_eq!(SynthesisError::Busy.error_code(), "E_SYNTHESIS_BUSY");
    }
}
