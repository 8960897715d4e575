//! Prompt construction for every render operation.
//!
//! Prompts are plain text. The recompose prompt is derived from the live
//! layer collection: each visible layer becomes one placement directive,
//! and hidden layer kinds are named in an explicit negative constraint so
//! the backend erases them instead of carrying them over from the source.

use std::fmt::Write as _;

use super::{BrandBrief, BrandKitKind, Theme, VariantKind};
use crate::layer::{Layer, LayerKind};

/// Text a layer of `kind` renders, for the placement directive.
fn layer_content<'a>(kind: LayerKind, brief: &'a BrandBrief) -> &'a str {
    match kind {
        LayerKind::Icon => "Main Icon",
        LayerKind::Text => &brief.brand_name,
        LayerKind::Slogan if brief.slogan.trim().is_empty() => "Tagline",
        LayerKind::Slogan => &brief.slogan,
    }
}

/// Prompt re-rendering the composition from its current layers.
#[must_use]
pub fn recompose_prompt(brief: &BrandBrief, layers: &[Layer], theme: Theme) -> String {
    let bg = theme.background();
    let mut prompt = String::from("Re-render this brand identity as a clean, high-fidelity vector-style logo.\n");

    let mut hidden: Vec<&str> = Vec::new();
    for layer in layers.iter().filter(|l| !l.visible) {
        let kind = layer.kind.as_str();
        if !hidden.contains(&kind) {
            hidden.push(kind);
        }
    }
    if !hidden.is_empty() {
        let names: Vec<String> = hidden.iter().map(|k| k.to_uppercase()).collect();
        let _ = writeln!(
            prompt,
            "NEGATIVE CONSTRAINT: do not render any {}. Erase them completely and fill with the background color {bg}.",
            names.join(" or ")
        );
    }

    prompt.push_str("Layers:\n");
    for layer in layers.iter().filter(|l| l.visible) {
        let _ = writeln!(
            prompt,
            "- {kind}: \"{content}\" at X:{x}% Y:{y}%, scale {scale}x, rotation {rot}deg, flipX {fx}, flipY {fy}, opacity {op}%, color {color}.",
            kind = layer.kind.as_str().to_uppercase(),
            content = layer_content(layer.kind, brief),
            x = layer.x.round(),
            y = layer.y.round(),
            scale = layer.scale,
            rot = layer.rotation,
            fx = layer.flip_x,
            fy = layer.flip_y,
            op = layer.opacity,
            color = layer.color.as_deref().unwrap_or(&brief.primary_color),
        );
    }

    let _ = write!(
        prompt,
        "Aesthetic: {style}, geometric precision. Background: solid {bg}. Main color: {primary}. Typography color: {text}.\n\
         Flat design, no raster noise, no trace of hidden elements.",
        style = brief.style,
        primary = brief.primary_color,
        text = theme.text_color(),
    );
    prompt
}

/// Prompt for one logo variant on the given theme.
#[must_use]
pub fn variant_prompt(brief: &BrandBrief, kind: VariantKind, theme: Theme) -> String {
    let bg = theme.background();
    let (mono, text) = match theme {
        Theme::Light => ("#000000", "#1D2B3A"),
        Theme::Dark => ("#FFFFFF", "#FFFFFF"),
    };
    let body = match kind {
        VariantKind::Icon => format!(
            "Render only the graphical icon of this logo, removing all text. Keep the icon's {} color and geometry exactly.",
            brief.primary_color
        ),
        VariantKind::Text => format!(
            "Render only the wordmark \"{}\", removing all icons. Premium typography in {text}.",
            brief.brand_name
        ),
        VariantKind::Monochrome => {
            format!("Render the full logo in exactly one color, {mono}, with no gradients.")
        }
        VariantKind::Inverted => "Render a high-contrast negative-space version with the primary colors swapped.".to_owned(),
        VariantKind::Stacked => "Re-render the logo in a stacked layout with the icon centered above the brand name.".to_owned(),
        VariantKind::Horizontal => "Re-render the logo in a wide horizontal layout with the icon left of the brand name.".to_owned(),
        VariantKind::Compact => "Render an ultra-compact favicon version with simplified geometry and a square aspect.".to_owned(),
        VariantKind::Watermark => "Render a monochrome ghosted version of the logo at 30% opacity.".to_owned(),
    };
    format!("{body} Style: {}. Solid {bg} background.", brief.style)
}

/// Prompt for one brand-kit mockup.
#[must_use]
pub fn brand_kit_prompt(brief: &BrandBrief, kind: BrandKitKind) -> String {
    let name = &brief.brand_name;
    let color = &brief.primary_color;
    let label = kind.label();
    match kind {
        BrandKitKind::BusinessCard => format!(
            "Professional business card mockup for {name}, front and back on a stone surface. \
             The attached logo is embossed on the front, {color} accents on the edges. Soft cinematic lighting."
        ),
        BrandKitKind::Stationery => format!(
            "A4 letterhead and envelope mockup for {name}. The attached logo sits in the header, \
             {color} footer details, premium paper texture."
        ),
        BrandKitKind::Social => format!(
            "Social media identity kit: circular profile avatar, wide banner and cover image, \
             all featuring the attached logo on a {color} gradient."
        ),
        BrandKitKind::Product => format!(
            "Studio product mockup of a {label} with the attached logo cleanly printed on it. \
             Realistic materials, reflections and shadows."
        ),
        BrandKitKind::Print => format!(
            "Layout mockup of a {label} with a clean grid and the attached logo at the top, \
             using {color} as the primary brand color."
        ),
        BrandKitKind::Presentation => format!(
            "16:9 slide deck template: a title slide with the attached logo and a content slide \
             with charts accented in {color}."
        ),
        BrandKitKind::Guidelines => format!(
            "Double-page spread of the {name} brand guidelines showing the attached logo's variations, \
             typography samples and a palette including {color}."
        ),
    }
}
