//! Synthesizer: retried backend calls, light/dark pairs, and batches.
//!
//! DESIGN
//! ======
//! One `Synthesizer` serves one composition. A busy flag makes every
//! operation mutually exclusive: a second call while one is outstanding is
//! rejected with `SynthesisError::Busy`, never queued or run concurrently.
//!
//! Variants are generated as a sequence of light/dark pairs. The two halves
//! of a pair run concurrently; pairs run one after another so load on the
//! backend stays bounded and progress can be reported per pair. Brand-kit
//! assets are generated strictly one at a time.

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::prompt::{brand_kit_prompt, recompose_prompt, variant_prompt};
use super::{BackendError, BrandBrief, GenerationBackend, Operation, RenderRequest, SynthesisError, Theme, with_retry};
use crate::config::RetryPolicy;
use crate::layer::Layer;

// =============================================================================
// KINDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantKind {
    Icon,
    Text,
    Monochrome,
    Inverted,
    Stacked,
    Horizontal,
    Compact,
    Watermark,
}

impl VariantKind {
    pub const ALL: [Self; 8] = [
        Self::Icon,
        Self::Text,
        Self::Monochrome,
        Self::Inverted,
        Self::Stacked,
        Self::Horizontal,
        Self::Compact,
        Self::Watermark,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::Text => "text",
            Self::Monochrome => "monochrome",
            Self::Inverted => "inverted",
            Self::Stacked => "stacked",
            Self::Horizontal => "horizontal",
            Self::Compact => "compact",
            Self::Watermark => "watermark",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Icon => "Icon Only",
            Self::Text => "Wordmark Only",
            Self::Monochrome => "Monochrome",
            Self::Inverted => "High Contrast",
            Self::Stacked => "Vertical Stack",
            Self::Horizontal => "Wide Landscape",
            Self::Compact => "Favicon Compact",
            Self::Watermark => "Translucent Ghost",
        }
    }

    #[must_use]
    pub fn usage_hint(self) -> &'static str {
        match self {
            Self::Icon => "App icons and social avatars.",
            Self::Text => "Stationery and editorial headers.",
            Self::Monochrome => "Single-color printing.",
            Self::Inverted => "Overlays on dark photography.",
            Self::Stacked => "Narrow packaging.",
            Self::Horizontal => "Website headers.",
            Self::Compact => "Browser tabs and tiny sizes.",
            Self::Watermark => "Protecting published imagery.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrandKitKind {
    BusinessCard,
    Stationery,
    Social,
    Product,
    Print,
    Presentation,
    Guidelines,
}

impl BrandKitKind {
    /// Generation order of a full kit.
    pub const ALL: [Self; 7] = [
        Self::BusinessCard,
        Self::Stationery,
        Self::Social,
        Self::Product,
        Self::Print,
        Self::Presentation,
        Self::Guidelines,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BusinessCard => "business-card",
            Self::Stationery => "stationery",
            Self::Social => "social",
            Self::Product => "product",
            Self::Print => "print",
            Self::Presentation => "presentation",
            Self::Guidelines => "guidelines",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BusinessCard => "Executive Business Card",
            Self::Stationery => "Premium Letterhead",
            Self::Social => "Social Profile Kit",
            Self::Product => "Matte Ceramic Mug",
            Self::Print => "Marketing Flyer",
            Self::Presentation => "Pitch Deck Template",
            Self::Guidelines => "Core Brand Manual",
        }
    }
}

// =============================================================================
// OUTPUTS
// =============================================================================

/// Light and dark renders of the same operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPair {
    pub light_url: String,
    pub dark_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoVariant {
    pub id: Uuid,
    pub kind: VariantKind,
    pub label: String,
    pub usage_hint: String,
    pub light_url: String,
    pub dark_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandKitAsset {
    pub id: Uuid,
    pub kind: BrandKitKind,
    pub label: String,
    pub image_url: String,
}

/// Batch progress, emitted before each item starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 0-based index of the item about to start.
    pub index: usize,
    pub total: usize,
    pub label: &'static str,
}

impl Progress {
    /// Completed share of the batch in percent.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        u8::try_from(self.index * 100 / self.total).unwrap_or(100)
    }
}

// =============================================================================
// SYNTHESIZER
// =============================================================================

/// Resets the busy flag when an operation finishes, however it finishes.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Issues retried backend calls for one composition, one operation at a time.
#[derive(Clone)]
pub struct Synthesizer {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
    busy: Arc<AtomicBool>,
}

impl Synthesizer {
    #[must_use]
    pub fn new(backend: Arc<dyn GenerationBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry, busy: Arc::new(AtomicBool::new(false)) }
    }

    /// Whether an operation is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<BusyGuard, SynthesisError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SynthesisError::Busy)?;
        Ok(BusyGuard(self.busy.clone()))
    }

    fn validate(brief: &BrandBrief, source: &str) -> Result<(), SynthesisError> {
        if brief.brand_name.trim().is_empty() {
            return Err(SynthesisError::MissingBrandName);
        }
        if source.trim().is_empty() {
            return Err(SynthesisError::MissingSource);
        }
        Ok(())
    }

    async fn render(&self, operation: Operation, source: &str, prompt: String) -> Result<String, BackendError> {
        let request = RenderRequest { operation, source_image: source.to_owned(), prompt };
        let label = operation.to_string();
        with_retry(&self.retry, &label, || self.backend.render(&request)).await
    }

    /// Re-render the composition's layers on both themes concurrently.
    ///
    /// # Errors
    ///
    /// `Busy` while another operation is outstanding, validation errors
    /// before any backend call, or the first backend failure.
    pub async fn recompose(&self, brief: &BrandBrief, source: &str, layers: &[Layer]) -> Result<RenderPair, SynthesisError> {
        Self::validate(brief, source)?;
        let _guard = self.acquire()?;
        info!(brand = %brief.brand_name, layers = layers.len(), "recompose started");
        let (light_url, dark_url) = tokio::try_join!(
            self.render(
                Operation::Recompose { theme: Theme::Light },
                source,
                recompose_prompt(brief, layers, Theme::Light)
            ),
            self.render(Operation::Recompose { theme: Theme::Dark }, source, recompose_prompt(brief, layers, Theme::Dark)),
        )
        .inspect_err(|e| warn!(error = %e, "recompose failed"))?;
        info!(brand = %brief.brand_name, "recompose finished");
        Ok(RenderPair { light_url, dark_url })
    }

    /// Generate every logo variant as sequential light/dark pairs.
    ///
    /// # Errors
    ///
    /// Same as [`Synthesizer::recompose`]. A failure stops the batch; no
    /// partial result is returned.
    pub async fn generate_variants(
        &self,
        brief: &BrandBrief,
        source: &str,
        mut on_progress: impl FnMut(Progress) + Send,
    ) -> Result<Vec<LogoVariant>, SynthesisError> {
        Self::validate(brief, source)?;
        let _guard = self.acquire()?;
        let total = VariantKind::ALL.len();
        let mut variants = Vec::with_capacity(total);

        for (index, kind) in VariantKind::ALL.into_iter().enumerate() {
            on_progress(Progress { index, total, label: kind.label() });
            let (light_url, dark_url) = tokio::try_join!(
                self.render(
                    Operation::Variant { kind, theme: Theme::Light },
                    source,
                    variant_prompt(brief, kind, Theme::Light)
                ),
                self.render(Operation::Variant { kind, theme: Theme::Dark }, source, variant_prompt(brief, kind, Theme::Dark)),
            )
            .inspect_err(|e| warn!(variant = kind.as_str(), error = %e, "variant batch failed"))?;
            variants.push(LogoVariant {
                id: Uuid::new_v4(),
                kind,
                label: kind.label().to_owned(),
                usage_hint: kind.usage_hint().to_owned(),
                light_url,
                dark_url,
            });
        }
        info!(count = variants.len(), "variants ready");
        Ok(variants)
    }

    /// Generate every brand-kit asset, one at a time.
    ///
    /// # Errors
    ///
    /// Same as [`Synthesizer::generate_variants`].
    pub async fn generate_brand_kit(
        &self,
        brief: &BrandBrief,
        source: &str,
        mut on_progress: impl FnMut(Progress) + Send,
    ) -> Result<Vec<BrandKitAsset>, SynthesisError> {
        Self::validate(brief, source)?;
        let _guard = self.acquire()?;
        let total = BrandKitKind::ALL.len();
        let mut assets = Vec::with_capacity(total);

        for (index, kind) in BrandKitKind::ALL.into_iter().enumerate() {
            on_progress(Progress { index, total, label: kind.label() });
            let image_url = self
                .render(Operation::BrandKitAsset { kind }, source, brand_kit_prompt(brief, kind))
                .await
                .inspect_err(|e| warn!(asset = kind.as_str(), error = %e, "brand kit failed"))?;
            assets.push(BrandKitAsset { id: Uuid::new_v4(), kind, label: kind.label().to_owned(), image_url });
        }
        info!(count = assets.len(), "brand kit ready");
        Ok(assets)
    }
}
