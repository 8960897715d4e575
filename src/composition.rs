//! Composition: the persisted logo aggregate.
//!
//! This is the shape written back to the enclosing application on commit:
//! brand attributes, the ordered layer array, animation tracks, and the most
//! recent light/dark renders. Render URLs are derived data; only a
//! successful synthesis replaces them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animation::Timeline;
use crate::layer::Layer;
use crate::synth::BrandBrief;
use crate::synth::batch::{BrandKitAsset, LogoVariant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub id: Uuid,
    pub brand_name: String,
    #[serde(default)]
    pub slogan: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    /// Image the composition was generated or imported from.
    #[serde(default)]
    pub source_url: String,
    /// Bottom-most layer first.
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub animation: Timeline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<LogoVariant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brand_kit: Vec<BrandKitAsset>,
}

fn default_style() -> String {
    "modern".to_owned()
}

fn default_primary_color() -> String {
    "#3B82F6".to_owned()
}

impl Composition {
    /// A new composition with no layers and no renders.
    #[must_use]
    pub fn new(brand_name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            brand_name: brand_name.into(),
            slogan: String::new(),
            style: default_style(),
            primary_color: default_primary_color(),
            source_url: source_url.into(),
            layers: Vec::new(),
            animation: Timeline::default(),
            light_url: None,
            dark_url: None,
            variants: Vec::new(),
            brand_kit: Vec::new(),
        }
    }

    /// Brand attributes the prompts draw from.
    #[must_use]
    pub fn brief(&self) -> BrandBrief {
        BrandBrief {
            brand_name: self.brand_name.clone(),
            slogan: self.slogan.clone(),
            style: self.style.clone(),
            primary_color: self.primary_color.clone(),
        }
    }

    /// Image new renders start from: the original source, falling back to
    /// the latest light render for compositions imported without one.
    #[must_use]
    pub fn render_source(&self) -> &str {
        if self.source_url.is_empty() {
            self.light_url.as_deref().unwrap_or_default()
        } else {
            &self.source_url
        }
    }
}
