//! Editor colour palettes chosen against the content behind a field.
//!
//! The background behind a hovered field is sampled, its luminance and a
//! rough colour temperature computed, and one of four fixed palettes picked
//! so the edit affordance stays readable. A palette is applied to the
//! hovered element's own style, never to the document root, so hovering two
//! fields with different backgrounds gives each its own palette.

use crate::dom::{Document, Element};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Attribute some sections use to declare their background colour.
pub const BACKGROUND_ATTR: &str = "data-bg";

/// Channel difference needed before a colour counts as warm or cool.
const TEMPERATURE_MARGIN: i16 = 20;

const DARK_THRESHOLD: f64 = 0.3;
const LIGHT_THRESHOLD: f64 = 0.7;

// ============================================================================
// Colours
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// WCAG relative luminance, 0.0 (black) to 1.0 (white).
    pub fn relative_luminance(&self) -> f64 {
        fn linear(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    pub fn temperature(&self) -> Temperature {
        let (r, b) = (self.r as i16, self.b as i16);
        if r - b > TEMPERATURE_MARGIN {
            Temperature::Warm
        } else if b - r > TEMPERATURE_MARGIN {
            Temperature::Cool
        } else {
            Temperature::Neutral
        }
    }
}

fn rgb_fn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9.]+)\s*)?\)$")
            .expect("valid regex")
    })
}

impl FromStr for Rgba {
    type Err = String;

    /// Accepts `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)`,
    /// `transparent`, `white` and `black`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "transparent" => return Ok(Rgba { r: 0, g: 0, b: 0, a: 0.0 }),
            "white" => return Ok(Rgba::WHITE),
            "black" => return Ok(Rgba::rgb(0, 0, 0)),
            _ => {}
        }
        if let Some(hex) = s.strip_prefix('#') {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(format!("unsupported colour `{}`", s));
            }
            let expanded: String = match hex.len() {
                3 => hex.chars().flat_map(|c| [c, c]).collect(),
                6 => hex.to_string(),
                _ => return Err(format!("unsupported colour `{}`", s)),
            };
            let channel = |i: usize| {
                u8::from_str_radix(&expanded[i..i + 2], 16)
                    .map_err(|_| format!("unsupported colour `{}`", s))
            };
            return Ok(Rgba::rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        let caps = rgb_fn_regex()
            .captures(&s)
            .ok_or_else(|| format!("unsupported colour `{}`", s))?;
        let channel = |i: usize| {
            caps[i]
                .parse::<u16>()
                .ok()
                .filter(|v| *v <= 255)
                .map(|v| v as u8)
                .ok_or_else(|| format!("channel out of range in `{}`", s))
        };
        let a = match caps.get(4) {
            Some(m) => m
                .as_str()
                .parse::<f64>()
                .map_err(|_| format!("bad alpha in `{}`", s))?,
            None => 1.0,
        };
        Ok(Rgba {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
            a,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Warm,
    Cool,
    Neutral,
}

// ============================================================================
// Palettes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteId {
    Neutral,
    Warm,
    Cool,
    Professional,
}

impl PaletteId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteId::Neutral => "neutral",
            PaletteId::Warm => "warm",
            PaletteId::Cool => "cool",
            PaletteId::Professional => "professional",
        }
    }

    pub fn palette(&self) -> &'static Palette {
        match self {
            PaletteId::Neutral => &NEUTRAL,
            PaletteId::Warm => &WARM,
            PaletteId::Cool => &COOL,
            PaletteId::Professional => &PROFESSIONAL,
        }
    }
}

impl fmt::Display for PaletteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub primary: &'static str,
    pub primary_hover: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub text_muted: &'static str,
    pub border: &'static str,
    pub shadow: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
}

pub const NEUTRAL: Palette = Palette {
    primary: "#4b5563",
    primary_hover: "#374151",
    background: "#ffffff",
    surface: "#f9fafb",
    text: "#111827",
    text_muted: "#6b7280",
    border: "#d1d5db",
    shadow: "rgba(17, 24, 39, 0.15)",
    success: "#059669",
    warning: "#d97706",
    error: "#dc2626",
};

pub const WARM: Palette = Palette {
    primary: "#c2410c",
    primary_hover: "#9a3412",
    background: "#fffbf5",
    surface: "#fff1e0",
    text: "#431407",
    text_muted: "#9a6b4f",
    border: "#fed7aa",
    shadow: "rgba(124, 45, 18, 0.2)",
    success: "#15803d",
    warning: "#b45309",
    error: "#b91c1c",
};

pub const COOL: Palette = Palette {
    primary: "#0369a1",
    primary_hover: "#075985",
    background: "#f5fbff",
    surface: "#e0f2fe",
    text: "#0c1e33",
    text_muted: "#557089",
    border: "#bae6fd",
    shadow: "rgba(12, 74, 110, 0.2)",
    success: "#0f766e",
    warning: "#ca8a04",
    error: "#be123c",
};

pub const PROFESSIONAL: Palette = Palette {
    primary: "#1e3a8a",
    primary_hover: "#172554",
    background: "#ffffff",
    surface: "#f1f5f9",
    text: "#0f172a",
    text_muted: "#64748b",
    border: "#cbd5e1",
    shadow: "rgba(15, 23, 42, 0.18)",
    success: "#166534",
    warning: "#a16207",
    error: "#991b1b",
};

impl Palette {
    /// CSS custom properties for this palette.
    pub fn css_variables(&self) -> [(&'static str, &'static str); 11] {
        [
            ("--editor-primary", self.primary),
            ("--editor-primary-hover", self.primary_hover),
            ("--editor-bg", self.background),
            ("--editor-surface", self.surface),
            ("--editor-text", self.text),
            ("--editor-text-muted", self.text_muted),
            ("--editor-border", self.border),
            ("--editor-shadow", self.shadow),
            ("--editor-success", self.success),
            ("--editor-warning", self.warning),
            ("--editor-error", self.error),
        ]
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Palette for content with the given luminance and temperature.
///
/// | luminance  | warm         | cool         | neutral      |
/// |------------|--------------|--------------|--------------|
/// | < 0.3      | cool         | warm         | cool         |
/// | 0.3 - 0.7  | neutral      | neutral      | neutral      |
/// | > 0.7      | cool         | professional | professional |
pub fn select_palette(luminance: f64, temperature: Temperature) -> PaletteId {
    if luminance < DARK_THRESHOLD {
        match temperature {
            Temperature::Warm => PaletteId::Cool,
            Temperature::Cool => PaletteId::Warm,
            Temperature::Neutral => PaletteId::Cool,
        }
    } else if luminance > LIGHT_THRESHOLD {
        match temperature {
            Temperature::Warm => PaletteId::Cool,
            Temperature::Cool | Temperature::Neutral => PaletteId::Professional,
        }
    } else {
        PaletteId::Neutral
    }
}

pub fn palette_for_color(color: Rgba) -> PaletteId {
    select_palette(color.relative_luminance(), color.temperature())
}

fn declared_background(el: &Element) -> Option<Rgba> {
    let raw = el
        .style_property("background-color")
        .or_else(|| el.style_property("background"))
        .or_else(|| el.attr(BACKGROUND_ATTR).map(str::to_string))?;
    // `background` shorthand may carry images and positions around the colour.
    colour_token_regex()
        .find_iter(&raw)
        .find_map(|m| m.as_str().parse::<Rgba>().ok())
}

fn colour_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)#[0-9a-f]{6}\b|#[0-9a-f]{3}\b|rgba?\([^)]*\)|\b(?:transparent|white|black)\b")
            .expect("valid regex")
    })
}

/// Effective background of the element at `path`: its own colour, or the
/// nearest ancestor's when transparent or unset. Defaults to white.
pub fn effective_background(doc: &Document, path: &[usize]) -> Rgba {
    let own = doc.get(path).into_iter();
    own.chain(doc.ancestors(path))
        .filter_map(declared_background)
        .find(|c| !c.is_transparent())
        .unwrap_or(Rgba::WHITE)
}

pub fn detect_optimal_theme(doc: &Document, path: &[usize]) -> PaletteId {
    let bg = effective_background(doc, path);
    let id = palette_for_color(bg);
    tracing::trace!(?bg, palette = %id, "selected editor palette");
    id
}

/// Write the palette's custom properties onto one element.
pub fn apply_palette(el: &mut Element, id: PaletteId) {
    for (name, value) in id.palette().css_variables() {
        el.set_style_property(name, value);
    }
    el.set_attr("data-editor-palette", id.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colours() {
        assert_eq!("#fff".parse::<Rgba>().unwrap(), Rgba::WHITE);
        assert_eq!("#1a2B3c".parse::<Rgba>().unwrap(), Rgba::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!("rgb(10, 20, 30)".parse::<Rgba>().unwrap(), Rgba::rgb(10, 20, 30));
        let c = "rgba(0,0,0,0)".parse::<Rgba>().unwrap();
        assert!(c.is_transparent());
        assert!("transparent".parse::<Rgba>().unwrap().is_transparent());
        assert!("rgb(300, 0, 0)".parse::<Rgba>().is_err());
        assert!("#12345".parse::<Rgba>().is_err());
        assert!("url(a.png)".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_non_ascii_hex_is_rejected() {
        assert!("#aéaé".parse::<Rgba>().is_err());
        assert!("#ééé".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_background_shorthand_with_rgb_colour() {
        let doc = Document::from_body(
            Element::new("body").with_child(
                Element::new("section")
                    .with_attr("style", "background: rgb(20, 10, 60) url(x.png) no-repeat")
                    .with_child(Element::new("h2").with_attr("id", "title")),
            ),
        );
        let title = doc.find_by_id("title").unwrap();
        assert_eq!(effective_background(&doc, &title), Rgba::rgb(20, 10, 60));
        assert_eq!(detect_optimal_theme(&doc, &title), PaletteId::Warm);
    }

    #[test]
    fn test_luminance_extremes() {
        assert!((Rgba::WHITE.relative_luminance() - 1.0).abs() < 1e-9);
        assert!(Rgba::rgb(0, 0, 0).relative_luminance().abs() < 1e-9);
        let grey = Rgba::rgb(128, 128, 128).relative_luminance();
        assert!(grey > 0.2 && grey < 0.23);
    }

    #[test]
    fn test_temperature() {
        assert_eq!(Rgba::rgb(200, 80, 40).temperature(), Temperature::Warm);
        assert_eq!(Rgba::rgb(20, 60, 160).temperature(), Temperature::Cool);
        assert_eq!(Rgba::rgb(100, 100, 110).temperature(), Temperature::Neutral);
    }

    #[test]
    fn test_dark_warm_background_gets_cool_palette() {
        let maroon = Rgba::rgb(120, 20, 10);
        assert!(maroon.relative_luminance() < 0.3);
        assert_eq!(palette_for_color(maroon), PaletteId::Cool);
        assert_ne!(palette_for_color(maroon), PaletteId::Neutral);
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(select_palette(0.1, Temperature::Cool), PaletteId::Warm);
        assert_eq!(select_palette(0.1, Temperature::Neutral), PaletteId::Cool);
        assert_eq!(select_palette(0.5, Temperature::Warm), PaletteId::Neutral);
        assert_eq!(select_palette(0.9, Temperature::Warm), PaletteId::Cool);
        assert_eq!(select_palette(0.9, Temperature::Neutral), PaletteId::Professional);
    }

    fn page() -> Document {
        Document::from_body(
            Element::new("body")
                .with_child(
                    Element::new("section")
                        .with_attr("style", "background: #2a0d05 url(hero.jpg) no-repeat")
                        .with_child(
                            Element::new("div")
                                .with_attr("style", "background-color: transparent")
                                .with_child(Element::new("h1").with_attr("id", "dark")),
                        ),
                )
                .with_child(
                    Element::new("section")
                        .with_attr(BACKGROUND_ATTR, "#f8fafc")
                        .with_child(Element::new("p").with_attr("id", "light")),
                )
                .with_child(Element::new("p").with_attr("id", "plain")),
        )
    }

    #[test]
    fn test_walks_up_past_transparent_ancestors() {
        let doc = page();
        let dark = doc.find_by_id("dark").unwrap();
        assert_eq!(effective_background(&doc, &dark), Rgba::rgb(0x2a, 0x0d, 0x05));
        assert_eq!(detect_optimal_theme(&doc, &dark), PaletteId::Cool);

        let light = doc.find_by_id("light").unwrap();
        assert_eq!(detect_optimal_theme(&doc, &light), PaletteId::Professional);

        let plain = doc.find_by_id("plain").unwrap();
        assert_eq!(effective_background(&doc, &plain), Rgba::WHITE);
    }

    #[test]
    fn test_palettes_apply_per_element() {
        let mut doc = page();
        let dark = doc.find_by_id("dark").unwrap();
        let light = doc.find_by_id("light").unwrap();
        let dark_id = detect_optimal_theme(&doc, &dark);
        let light_id = detect_optimal_theme(&doc, &light);
        apply_palette(doc.get_mut(&dark).unwrap(), dark_id);
        apply_palette(doc.get_mut(&light).unwrap(), light_id);

        let dark_el = doc.get(&dark).unwrap();
        let light_el = doc.get(&light).unwrap();
        assert_eq!(dark_el.style_property("--editor-primary").as_deref(), Some(COOL.primary));
        assert_eq!(light_el.style_property("--editor-primary").as_deref(), Some(PROFESSIONAL.primary));
        assert!(doc.root.attr("style").is_none());
    }
}
