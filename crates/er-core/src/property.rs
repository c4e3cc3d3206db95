use std::fmt;

use serde::{Deserialize, Serialize};

/// Business-object property addressed by its wire name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Name,
    ErType,
    IsWeak,
    IsPrimaryKey,
    IsRequired,
    IsMultivalued,
    IsDerived,
    IsComposite,
    IsSubAttribute,
    DataType,
    IsIdentifying,
    CardinalitySource,
    CardinalityTarget,
    Cardinality,
    Description,
    Nullable,
    Type,
    IsDeclarative,
    MermaidCardinality,
    /// Anything else, stored verbatim in the raw attribute map.
    Other(String),
}

/// How a property write reaches the business object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteStrategy {
    /// Written straight into the record, never through the host mutation API.
    CardinalityDirect,
    /// ER custom property, written straight into the record.
    Direct,
    /// Host mutation API first, direct write as a fallback.
    HostMediated,
}

impl WriteStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CardinalityDirect => "cardinality-direct",
            Self::Direct => "direct",
            Self::HostMediated => "host-mediated",
        }
    }
}

impl Property {
    /// Every named property, in declaration order.
    pub const KNOWN: [Self; 19] = [
        Self::Name,
        Self::ErType,
        Self::IsWeak,
        Self::IsPrimaryKey,
        Self::IsRequired,
        Self::IsMultivalued,
        Self::IsDerived,
        Self::IsComposite,
        Self::IsSubAttribute,
        Self::DataType,
        Self::IsIdentifying,
        Self::CardinalitySource,
        Self::CardinalityTarget,
        Self::Cardinality,
        Self::Description,
        Self::Nullable,
        Self::Type,
        Self::IsDeclarative,
        Self::MermaidCardinality,
    ];

    #[must_use]
    pub fn parse(name: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|p| p.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Other(name.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::ErType => "erType",
            Self::IsWeak => "isWeak",
            Self::IsPrimaryKey => "isPrimaryKey",
            Self::IsRequired => "isRequired",
            Self::IsMultivalued => "isMultivalued",
            Self::IsDerived => "isDerived",
            Self::IsComposite => "isComposite",
            Self::IsSubAttribute => "isSubAttribute",
            Self::DataType => "dataType",
            Self::IsIdentifying => "isIdentifying",
            Self::CardinalitySource => "cardinalitySource",
            Self::CardinalityTarget => "cardinalityTarget",
            Self::Cardinality => "cardinality",
            Self::Description => "description",
            Self::Nullable => "nullable",
            Self::Type => "type",
            Self::IsDeclarative => "isDeclarative",
            Self::MermaidCardinality => "mermaidCardinality",
            Self::Other(name) => name,
        }
    }

    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(
            self,
            Self::IsWeak
                | Self::IsPrimaryKey
                | Self::IsRequired
                | Self::IsMultivalued
                | Self::IsDerived
                | Self::IsComposite
                | Self::IsSubAttribute
                | Self::IsIdentifying
                | Self::Nullable
                | Self::IsDeclarative
        )
    }

    #[must_use]
    pub const fn is_cardinality_endpoint(&self) -> bool {
        matches!(self, Self::CardinalitySource | Self::CardinalityTarget)
    }

    /// Member of the fixed set of ER properties written without the host API.
    #[must_use]
    pub const fn is_er_custom(&self) -> bool {
        matches!(
            self,
            Self::IsWeak
                | Self::IsPrimaryKey
                | Self::IsRequired
                | Self::IsMultivalued
                | Self::IsDerived
                | Self::IsComposite
                | Self::IsSubAttribute
                | Self::DataType
                | Self::Description
                | Self::ErType
                | Self::Cardinality
                | Self::IsIdentifying
                | Self::Nullable
                | Self::Type
                | Self::IsDeclarative
                | Self::MermaidCardinality
        )
    }

    /// Properties whose change alters the rendered output.
    #[must_use]
    pub fn is_visual(&self) -> bool {
        match self {
            Self::Name
            | Self::ErType
            | Self::IsWeak
            | Self::IsPrimaryKey
            | Self::IsRequired
            | Self::IsMultivalued
            | Self::IsDerived
            | Self::IsComposite
            | Self::IsSubAttribute
            | Self::IsIdentifying
            | Self::CardinalitySource
            | Self::CardinalityTarget
            | Self::Cardinality => true,
            Self::Other(key) => is_color_key(key),
            _ => false,
        }
    }

    /// Changing any of these forces a full shape redraw in a batch.
    #[must_use]
    pub const fn requires_full_redraw(&self) -> bool {
        matches!(
            self,
            Self::Name | Self::ErType | Self::IsWeak | Self::IsIdentifying
        )
    }

    #[must_use]
    pub const fn write_strategy(&self) -> WriteStrategy {
        if self.is_cardinality_endpoint() {
            WriteStrategy::CardinalityDirect
        } else if self.is_er_custom() {
            WriteStrategy::Direct
        } else {
            WriteStrategy::HostMediated
        }
    }
}

fn is_color_key(key: &str) -> bool {
    matches!(
        key,
        "bioc:fill" | "bioc:stroke" | "color:background-color" | "color:border-color"
    )
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Value carried by a property write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    /// Booleans, plus the strings `true`/`false` used by imported documents.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Self::Null => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Interpret a command-line literal: `true`, `false`, `null`, or text.
    #[must_use]
    pub fn parse_literal(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            "null" => Self::Null,
            other => Self::Text(other.to_string()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
