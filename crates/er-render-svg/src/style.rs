//! Fill/stroke resolution for ER elements and text contrast helpers.

use std::str::FromStr;

use er_core::{BusinessObject, Element, ErType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreset {
    #[default]
    Default,
    /// Black outlines on white with a single highlight color.
    HighContrast,
    /// Grayscale only.
    Monochrome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseThemePresetError(String);

impl std::fmt::Display for ParseThemePresetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown theme preset: {}", self.0)
    }
}

impl std::error::Error for ParseThemePresetError {}

impl FromStr for ThemePreset {
    type Err = ParseThemePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "high-contrast" | "highcontrast" => Ok(Self::HighContrast),
            "monochrome" | "mono" => Ok(Self::Monochrome),
            _ => Err(ParseThemePresetError(s.to_string())),
        }
    }
}

impl ThemePreset {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::HighContrast => "high-contrast",
            Self::Monochrome => "monochrome",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementColors {
    pub fill: String,
    pub stroke: String,
}

impl ElementColors {
    fn pair(fill: &str, stroke: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
        }
    }
}

/// Default colors per element type and state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErPalette {
    pub entity: ElementColors,
    pub weak_entity: ElementColors,
    pub relationship: ElementColors,
    pub identifying_relationship: ElementColors,
    pub attribute: ElementColors,
    pub primary_key: ElementColors,
    pub multivalued: ElementColors,
    pub derived: ElementColors,
    pub composite: ElementColors,
    pub sub_attribute: ElementColors,
    pub container: ElementColors,
    pub connection: String,
    pub parent_child: String,
}

impl Default for ErPalette {
    fn default() -> Self {
        Self::from_preset(ThemePreset::Default)
    }
}

impl ErPalette {
    #[must_use]
    pub fn from_preset(preset: ThemePreset) -> Self {
        let c = ElementColors::pair;
        match preset {
            ThemePreset::Default => Self {
                entity: c("#E3F2FD", "#1976D2"),
                weak_entity: c("#E8EAF6", "#3F51B5"),
                relationship: c("#FFF3E0", "#F57C00"),
                identifying_relationship: c("#FFE0B2", "#E65100"),
                attribute: c("#F1F8E9", "#689F38"),
                primary_key: c("#FFF9C4", "#F9A825"),
                multivalued: c("#E0F7FA", "#00838F"),
                derived: c("#F3E5F5", "#8E24AA"),
                composite: c("#EDE7F6", "#5E35B1"),
                sub_attribute: c("#F9FBE7", "#AFB42B"),
                container: c("#FAFAFA", "#9E9E9E"),
                connection: "#424242".into(),
                parent_child: "#9E9E9E".into(),
            },
            ThemePreset::HighContrast => Self {
                entity: c("#FFFFFF", "#000000"),
                weak_entity: c("#FFFFFF", "#000000"),
                relationship: c("#FFFFFF", "#000000"),
                identifying_relationship: c("#FFFFFF", "#000000"),
                attribute: c("#FFFFFF", "#000000"),
                primary_key: c("#FFFF00", "#000000"),
                multivalued: c("#FFFFFF", "#000000"),
                derived: c("#FFFFFF", "#000000"),
                composite: c("#FFFFFF", "#000000"),
                sub_attribute: c("#FFFFFF", "#000000"),
                container: c("#FFFFFF", "#000000"),
                connection: "#000000".into(),
                parent_child: "#000000".into(),
            },
            ThemePreset::Monochrome => Self {
                entity: c("#FFFFFF", "#212121"),
                weak_entity: c("#EEEEEE", "#212121"),
                relationship: c("#FFFFFF", "#424242"),
                identifying_relationship: c("#E0E0E0", "#212121"),
                attribute: c("#FFFFFF", "#616161"),
                primary_key: c("#E0E0E0", "#212121"),
                multivalued: c("#F5F5F5", "#424242"),
                derived: c("#FAFAFA", "#757575"),
                composite: c("#F5F5F5", "#616161"),
                sub_attribute: c("#FAFAFA", "#757575"),
                container: c("#FAFAFA", "#9E9E9E"),
                connection: "#424242".into(),
                parent_child: "#9E9E9E".into(),
            },
        }
    }

    /// Type and state defaults, ignoring user colors.
    #[must_use]
    pub fn defaults_for(&self, er_type: ErType, bo: &BusinessObject) -> &ElementColors {
        use er_core::Property;
        match er_type {
            ErType::Entity if bo.flag(&Property::IsWeak) => &self.weak_entity,
            ErType::Entity => &self.entity,
            ErType::Relationship if bo.flag(&Property::IsIdentifying) => {
                &self.identifying_relationship
            }
            ErType::Relationship => &self.relationship,
            ErType::Attribute => {
                if bo.flag(&Property::IsPrimaryKey) {
                    &self.primary_key
                } else if bo.flag(&Property::IsMultivalued) {
                    &self.multivalued
                } else if bo.flag(&Property::IsDerived) {
                    &self.derived
                } else if bo.flag(&Property::IsComposite) {
                    &self.composite
                } else if bo.flag(&Property::IsSubAttribute) {
                    &self.sub_attribute
                } else {
                    &self.attribute
                }
            }
            ErType::CompositeAttribute => &self.composite,
            ErType::SubAttribute => &self.container,
        }
    }
}

const USER_FILL_KEYS: [&str; 2] = ["bioc:fill", "color:background-color"];
const USER_STROKE_KEYS: [&str; 2] = ["bioc:stroke", "color:border-color"];
const DEFAULT_USER_STROKE: &str = "#000000";

fn user_color(bo: &BusinessObject, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| bo.raw(key))
        .find(|value| parse_hex_color(value).is_some())
        .map(|value| value.trim().to_string())
}

/// Final fill and stroke for an element.
///
/// User colors stored in raw attributes win when `customization` is on; once
/// either is set, a missing stroke becomes black and a missing fill takes the
/// type default.
#[must_use]
pub fn element_colors(
    element: &Element,
    palette: &ErPalette,
    customization: bool,
) -> ElementColors {
    let bo = &element.business_object;
    let defaults = element
        .er_type()
        .map_or(&palette.entity, |er_type| palette.defaults_for(er_type, bo));

    if customization {
        let fill = user_color(bo, &USER_FILL_KEYS);
        let stroke = user_color(bo, &USER_STROKE_KEYS);
        if fill.is_some() || stroke.is_some() {
            return ElementColors {
                fill: fill.unwrap_or_else(|| defaults.fill.clone()),
                stroke: stroke.unwrap_or_else(|| DEFAULT_USER_STROKE.to_string()),
            };
        }
    }
    defaults.clone()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Perceived brightness on a 0..=255 scale (ITU-R 601 weights).
    #[must_use]
    pub fn brightness(self) -> f64 {
        (299.0 * f64::from(self.r) + 587.0 * f64::from(self.g) + 114.0 * f64::from(self.b))
            / 1000.0
    }
}

/// Parse `#RGB` or `#RRGGBB`. Anything else is rejected.
#[must_use]
pub fn parse_hex_color(value: &str) -> Option<Rgb> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => Some(Rgb {
            r: channel(&hex[0..1])? * 17,
            g: channel(&hex[1..2])? * 17,
            b: channel(&hex[2..3])? * 17,
        }),
        6 => Some(Rgb {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
        }),
        _ => None,
    }
}

const DARK_TEXT: &str = "#000000";
const LIGHT_TEXT: &str = "#FFFFFF";
const BRIGHTNESS_THRESHOLD: f64 = 128.0;

/// Black text on light backgrounds, white on dark. Malformed input gets black.
#[must_use]
pub fn contrast_color(background: &str) -> &'static str {
    if is_color_dark(background) {
        LIGHT_TEXT
    } else {
        DARK_TEXT
    }
}

#[must_use]
pub fn is_color_dark(color: &str) -> bool {
    parse_hex_color(color).is_some_and(|rgb| rgb.brightness() < BRIGHTNESS_THRESHOLD)
}
