use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::locale::Locale;
use crate::notation::Notation;
use crate::{MIN_SHAPE_HEIGHT, MIN_SHAPE_WIDTH};

/// Editor-wide settings handed to renderers and services at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErConfig {
    pub notation: Notation,
    pub locale: Locale,
    /// Theme preset name (`default`, `high-contrast`, `monochrome`).
    pub theme: String,
    /// Honor user colors stored on business objects.
    pub color_customization: bool,
    pub min_width: f64,
    pub min_height: f64,
    pub label_font_size: f64,
    /// Upper bound for deferred redraws, in milliseconds.
    pub defer_ms: u64,
    pub search_radius: f64,
    pub search_step: f64,
}

impl Default for ErConfig {
    fn default() -> Self {
        Self {
            notation: Notation::Chen,
            locale: Locale::PtBr,
            theme: String::from("default"),
            color_customization: true,
            min_width: MIN_SHAPE_WIDTH,
            min_height: MIN_SHAPE_HEIGHT,
            label_font_size: 12.0,
            defer_ms: 50,
            search_radius: 300.0,
            search_step: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErConfigError {
    pub field: String,
    pub value: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ErConfigParse {
    pub config: ErConfig,
    pub warnings: Vec<String>,
    pub errors: Vec<ErConfigError>,
}

/// Parse editor settings from JSON, keeping defaults for anything invalid.
#[must_use]
pub fn parse_er_config_value(value: &Value) -> ErConfigParse {
    let mut parsed = ErConfigParse::default();
    let Some(config_obj) = value.as_object() else {
        parsed.errors.push(ErConfigError {
            field: "$".to_string(),
            value: value.to_string(),
            message: "config root must be a JSON object".to_string(),
        });
        return parsed;
    };

    for (key, raw_value) in config_obj {
        match key.as_str() {
            "notation" => match raw_value.as_str().and_then(Notation::parse) {
                Some(notation) => parsed.config.notation = notation,
                None => push_error(
                    &mut parsed,
                    "notation",
                    raw_value,
                    "must be \"chen\" or \"crowsfoot\"",
                ),
            },
            "locale" => match raw_value.as_str().and_then(Locale::parse) {
                Some(locale) => parsed.config.locale = locale,
                None => push_error(&mut parsed, "locale", raw_value, "must be \"pt-br\" or \"en\""),
            },
            "theme" => match raw_value.as_str() {
                Some(theme) => parsed.config.theme = theme.to_string(),
                None => push_error(&mut parsed, "theme", raw_value, "must be a string"),
            },
            "colorCustomization" => match raw_value.as_bool() {
                Some(enabled) => parsed.config.color_customization = enabled,
                None => push_error(
                    &mut parsed,
                    "colorCustomization",
                    raw_value,
                    "must be a boolean",
                ),
            },
            "minWidth" => {
                if let Some(v) = positive_number(&mut parsed, "minWidth", raw_value) {
                    parsed.config.min_width = v;
                }
            }
            "minHeight" => {
                if let Some(v) = positive_number(&mut parsed, "minHeight", raw_value) {
                    parsed.config.min_height = v;
                }
            }
            "labelFontSize" => {
                if let Some(v) = positive_number(&mut parsed, "labelFontSize", raw_value) {
                    parsed.config.label_font_size = v;
                }
            }
            "searchRadius" => {
                if let Some(v) = positive_number(&mut parsed, "searchRadius", raw_value) {
                    parsed.config.search_radius = v;
                }
            }
            "searchStep" => {
                if let Some(v) = positive_number(&mut parsed, "searchStep", raw_value) {
                    parsed.config.search_step = v;
                }
            }
            "deferMs" => match raw_value.as_u64() {
                Some(ms) if ms <= 500 => parsed.config.defer_ms = ms,
                _ => push_error(
                    &mut parsed,
                    "deferMs",
                    raw_value,
                    "must be an integer between 0 and 500",
                ),
            },
            other => parsed
                .warnings
                .push(format!("Unsupported config key '{other}' ignored")),
        }
    }

    parsed
}

fn positive_number(parsed: &mut ErConfigParse, field: &str, value: &Value) -> Option<f64> {
    match value.as_f64() {
        Some(number) if number.is_finite() && number > 0.0 => Some(number),
        _ => {
            push_error(parsed, field, value, "must be a positive number");
            None
        }
    }
}

fn push_error(parsed: &mut ErConfigParse, field: &str, value: &Value, message: &str) {
    parsed.errors.push(ErConfigError {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_editor_conventions() {
        let config = ErConfig::default();
        assert_eq!(config.notation, Notation::Chen);
        assert_eq!(config.min_width, 50.0);
        assert_eq!(config.min_height, 30.0);
    }

    #[test]
    fn parses_known_fields() {
        let parsed = parse_er_config_value(&json!({
            "notation": "crowsfoot",
            "locale": "en",
            "colorCustomization": false,
            "searchStep": 25,
            "deferMs": 0
        }));
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.config.notation, Notation::CrowsFoot);
        assert_eq!(parsed.config.locale, Locale::En);
        assert!(!parsed.config.color_customization);
        assert_eq!(parsed.config.search_step, 25.0);
        assert_eq!(parsed.config.defer_ms, 0);
    }

    #[test]
    fn invalid_fields_keep_defaults_and_report() {
        let parsed = parse_er_config_value(&json!({
            "notation": "uml",
            "minWidth": -4,
            "deferMs": 10_000,
            "legacyWindowFlag": true
        }));
        let fields: Vec<_> = parsed.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields.len(), 3);
        assert!(fields.contains(&"notation"));
        assert!(fields.contains(&"minWidth"));
        assert!(fields.contains(&"deferMs"));
        assert_eq!(parsed.config.notation, Notation::Chen);
        assert_eq!(parsed.config.min_width, 50.0);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn non_object_root_is_an_error() {
        let parsed = parse_er_config_value(&json!("chen"));
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].field, "$");
    }
}
