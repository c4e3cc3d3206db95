use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cardinality::{Cardinality, normalize_cardinality};
use crate::locale::Locale;
use crate::model::ErType;

/// How cardinality is drawn at connection endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Formatted `(min,max)` text next to the endpoint.
    Label,
    /// Circle / bar / crow's-foot clusters.
    Symbols,
}

/// Immutable decision table for one notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotationRules {
    pub relationship_is_element: bool,
    pub attributes_on_relationships: bool,
    pub entity_to_entity: bool,
    pub valid_cardinalities: &'static [Cardinality],
    pub marker_style: MarkerStyle,
}

const CHEN_RULES: NotationRules = NotationRules {
    relationship_is_element: true,
    attributes_on_relationships: true,
    entity_to_entity: false,
    valid_cardinalities: &Cardinality::ALL,
    marker_style: MarkerStyle::Label,
};

const CROWS_FOOT_RULES: NotationRules = NotationRules {
    relationship_is_element: false,
    attributes_on_relationships: false,
    entity_to_entity: true,
    valid_cardinalities: &Cardinality::ALL,
    marker_style: MarkerStyle::Symbols,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    #[default]
    Chen,
    #[serde(alias = "crows-foot")]
    CrowsFoot,
}

impl Notation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chen => "chen",
            Self::CrowsFoot => "crowsfoot",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chen" => Some(Self::Chen),
            "crowsfoot" | "crows-foot" | "crow's-foot" | "crows_foot" => Some(Self::CrowsFoot),
            _ => None,
        }
    }

    #[must_use]
    pub const fn rules(self) -> &'static NotationRules {
        match self {
            Self::Chen => &CHEN_RULES,
            Self::CrowsFoot => &CROWS_FOOT_RULES,
        }
    }

    #[must_use]
    pub const fn marker_style(self) -> MarkerStyle {
        self.rules().marker_style
    }

    /// Values an editor may offer for a connection; empty when an attribute is involved.
    #[must_use]
    pub fn cardinality_options(self, source: ErType, target: ErType) -> Vec<Cardinality> {
        if source.is_attribute_like() || target.is_attribute_like() {
            return Vec::new();
        }
        self.rules().valid_cardinalities.to_vec()
    }

    #[must_use]
    pub fn validate_connection(self, source: ErType, target: ErType) -> bool {
        use crate::model::ErType::{Entity, Relationship};
        match self {
            Self::Chen => !matches!(
                (source, target),
                (Entity, Entity) | (Relationship, Relationship)
            ),
            Self::CrowsFoot => {
                if source == Relationship || target == Relationship {
                    return false;
                }
                if source.is_attribute_like() || target.is_attribute_like() {
                    return source == Entity || target == Entity;
                }
                true
            }
        }
    }

    /// Default cardinality for the `source` endpoint of a `source -> target` connection.
    #[must_use]
    pub fn default_cardinality(self, source: ErType, target: ErType) -> Cardinality {
        match self {
            Self::Chen => {
                if source == ErType::Entity {
                    Cardinality::OneOne
                } else if target == ErType::Entity {
                    Cardinality::OneMany
                } else {
                    Cardinality::OneOne
                }
            }
            Self::CrowsFoot => {
                if source == ErType::Entity && target == ErType::Entity {
                    Cardinality::OneMany
                } else {
                    Cardinality::OneOne
                }
            }
        }
    }

    /// Defaults for both ends: `(source side, target side)`.
    #[must_use]
    pub fn default_pair(self, source: ErType, target: ErType) -> (Cardinality, Cardinality) {
        (
            self.default_cardinality(source, target),
            self.default_cardinality(target, source),
        )
    }

    /// Human-readable form: `(1,N)` for Chen, a phrase for Crow's Foot.
    #[must_use]
    pub fn format_cardinality_display(self, value: &str, locale: Locale) -> String {
        let canonical = Cardinality::parse(value)
            .unwrap_or_else(|| Cardinality::from_notation(normalize_cardinality(value)));
        match self {
            Self::Chen => {
                let (min, max) = canonical.bounds();
                format!("({min},{max})")
            }
            Self::CrowsFoot => locale.labels().phrase(canonical.notation()).to_string(),
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ErType::{Attribute, CompositeAttribute, Entity, Relationship, SubAttribute};

    #[test]
    fn chen_routes_entities_through_relationships() {
        let chen = Notation::Chen;
        assert!(!chen.validate_connection(Entity, Entity));
        assert!(!chen.validate_connection(Relationship, Relationship));
        assert!(chen.validate_connection(Entity, Relationship));
        assert!(chen.validate_connection(Attribute, Relationship));
    }

    #[test]
    fn crows_foot_has_no_relationship_element() {
        let cf = Notation::CrowsFoot;
        assert!(cf.validate_connection(Entity, Entity));
        assert!(cf.validate_connection(Attribute, Entity));
        assert!(cf.validate_connection(Entity, SubAttribute));
        assert!(!cf.validate_connection(Attribute, Attribute));
        assert!(!cf.validate_connection(Attribute, Relationship));
        assert!(!cf.validate_connection(Entity, Relationship));
        assert!(!cf.rules().relationship_is_element);
    }

    #[test]
    fn defaults_per_notation() {
        assert_eq!(
            Notation::Chen.default_cardinality(Entity, Relationship),
            Cardinality::OneOne
        );
        assert_eq!(
            Notation::Chen.default_cardinality(Relationship, Entity),
            Cardinality::OneMany
        );
        assert_eq!(
            Notation::CrowsFoot.default_pair(Entity, Entity),
            (Cardinality::OneMany, Cardinality::OneMany)
        );
        assert_eq!(
            Notation::CrowsFoot.default_cardinality(Entity, Attribute),
            Cardinality::OneOne
        );
    }

    #[test]
    fn options_are_empty_for_attribute_connections() {
        assert!(
            Notation::Chen
                .cardinality_options(Attribute, Entity)
                .is_empty()
        );
        assert!(
            Notation::CrowsFoot
                .cardinality_options(Entity, CompositeAttribute)
                .is_empty()
        );
        assert_eq!(
            Notation::Chen.cardinality_options(Entity, Relationship),
            Cardinality::ALL.to_vec()
        );
    }

    #[test]
    fn display_formats() {
        assert_eq!(
            Notation::Chen.format_cardinality_display("1..N", Locale::En),
            "(1,N)"
        );
        assert_eq!(
            Notation::CrowsFoot.format_cardinality_display("0..1", Locale::En),
            "zero or one"
        );
        assert_eq!(
            Notation::CrowsFoot.format_cardinality_display("1..N", Locale::PtBr),
            "um ou muitos"
        );
    }

    #[test]
    fn notation_names_parse() {
        assert_eq!(Notation::parse("CrowsFoot"), Some(Notation::CrowsFoot));
        assert_eq!(Notation::parse("idef1x"), None);
        let parsed: Notation = serde_json::from_str("\"crowsfoot\"").expect("json");
        assert_eq!(parsed, Notation::CrowsFoot);
    }
}
