use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ErError;
use crate::property::{Property, PropertyValue};

/// Prefixes tried, in order, when a value is looked up in the raw attribute map.
pub const RAW_KEY_PREFIXES: [&str; 3] = ["er:", "ns0:", ""];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Grow (or shrink, for negative values) the box on every side.
    #[must_use]
    pub fn inflate(self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }
}

/// Semantic type of an ER element, independent of the host shape type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErType {
    Entity,
    Relationship,
    Attribute,
    SubAttribute,
    CompositeAttribute,
}

impl ErType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "Entity",
            Self::Relationship => "Relationship",
            Self::Attribute => "Attribute",
            Self::SubAttribute => "SubAttribute",
            Self::CompositeAttribute => "CompositeAttribute",
        }
    }

    /// Parse a semantic type tag. Accepts the `er:` host prefix and any casing.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let bare = trimmed.strip_prefix("er:").unwrap_or(trimmed);
        match bare.to_ascii_lowercase().as_str() {
            "entity" => Some(Self::Entity),
            "relationship" => Some(Self::Relationship),
            "attribute" => Some(Self::Attribute),
            "subattribute" | "sub-attribute" => Some(Self::SubAttribute),
            "compositeattribute" | "composite-attribute" | "composite" => {
                Some(Self::CompositeAttribute)
            }
            _ => None,
        }
    }

    /// Attributes and the containers that group them.
    #[must_use]
    pub const fn is_attribute_like(self) -> bool {
        matches!(
            self,
            Self::Attribute | Self::SubAttribute | Self::CompositeAttribute
        )
    }

    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::SubAttribute | Self::CompositeAttribute)
    }
}

impl fmt::Display for ErType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionKind {
    #[default]
    Standard,
    /// Containment link between a composite attribute and its parts.
    ParentChild,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConnectionData {
    pub source: ElementId,
    pub target: ElementId,
    pub waypoints: Vec<Point>,
    #[serde(default)]
    pub kind: ConnectionKind,
}

/// Semantic payload attached to an element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessObject {
    pub name: Option<String>,
    pub er_type: Option<ErType>,
    pub is_weak: bool,
    pub is_primary_key: bool,
    pub is_required: bool,
    pub is_multivalued: bool,
    pub is_derived: bool,
    pub is_composite: bool,
    pub is_sub_attribute: bool,
    pub data_type: Option<String>,
    pub is_identifying: bool,
    pub cardinality_source: Option<String>,
    pub cardinality_target: Option<String>,
    pub cardinality: Option<String>,
    pub description: Option<String>,
    pub nullable: bool,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub is_declarative: bool,
    pub mermaid_cardinality: Option<String>,
    /// Imported attributes that have no typed counterpart, keyed with their namespace.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub raw_attributes: BTreeMap<String, String>,
}

impl BusinessObject {
    /// Look a key up in the raw attribute map using the fixed prefix order.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        RAW_KEY_PREFIXES.iter().find_map(|prefix| {
            self.raw_attributes
                .get(&format!("{prefix}{key}"))
                .map(String::as_str)
        })
    }

    fn raw_flag(&self, key: &str) -> bool {
        self.raw(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    fn raw_text(&self, key: &str) -> Option<&str> {
        self.raw(key).filter(|v| !v.trim().is_empty())
    }

    /// Boolean accessor: typed field first, raw attributes second.
    #[must_use]
    pub fn flag(&self, property: &Property) -> bool {
        let typed = match property {
            Property::IsWeak => self.is_weak,
            Property::IsPrimaryKey => self.is_primary_key,
            Property::IsRequired => self.is_required,
            Property::IsMultivalued => self.is_multivalued,
            Property::IsDerived => self.is_derived,
            Property::IsComposite => self.is_composite,
            Property::IsSubAttribute => self.is_sub_attribute,
            Property::IsIdentifying => self.is_identifying,
            Property::Nullable => self.nullable,
            Property::IsDeclarative => self.is_declarative,
            _ => return false,
        };
        typed || self.raw_flag(property.as_str())
    }

    /// Text accessor: typed field first, raw attributes second. Empty strings count as unset.
    #[must_use]
    pub fn text(&self, property: &Property) -> Option<&str> {
        let typed = match property {
            Property::Name => self.name.as_deref(),
            Property::DataType => self.data_type.as_deref(),
            Property::CardinalitySource => self.cardinality_source.as_deref(),
            Property::CardinalityTarget => self.cardinality_target.as_deref(),
            Property::Cardinality => self.cardinality.as_deref(),
            Property::Description => self.description.as_deref(),
            Property::Type => self.type_name.as_deref(),
            Property::MermaidCardinality => self.mermaid_cardinality.as_deref(),
            Property::ErType => self.er_type.map(ErType::as_str),
            Property::Other(key) => return self.raw_attributes.get(key).map(String::as_str),
            _ => None,
        };
        typed
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.raw_text(property.as_str()))
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.text(&Property::Name)
    }

    #[must_use]
    pub fn er_type(&self) -> Option<ErType> {
        self.er_type
            .or_else(|| self.raw("erType").and_then(ErType::parse))
    }

    #[must_use]
    pub fn get(&self, property: &Property) -> PropertyValue {
        if property.is_boolean() {
            return PropertyValue::Bool(self.flag(property));
        }
        self.text(property)
            .map_or(PropertyValue::Null, |v| PropertyValue::Text(v.to_string()))
    }

    /// Write a property value directly into the record.
    ///
    /// # Errors
    ///
    /// Returns [`ErError::InvalidValue`] when the value does not fit the
    /// property's type (for example a non-boolean string for `isWeak`).
    pub fn set(&mut self, property: &Property, value: PropertyValue) -> Result<(), ErError> {
        let invalid = || ErError::InvalidValue {
            property: property.as_str().to_string(),
            value: value.to_string(),
        };

        if let Property::Other(key) = property {
            match value.as_text() {
                Some(text) => {
                    self.raw_attributes.insert(key.clone(), text.to_string());
                }
                None if value.is_null() => {
                    self.raw_attributes.remove(key);
                }
                None => {
                    self.raw_attributes.insert(key.clone(), value.to_string());
                }
            }
            return Ok(());
        }

        if property.is_boolean() {
            let flag = value.as_bool().ok_or_else(invalid)?;
            match property {
                Property::IsWeak => self.is_weak = flag,
                Property::IsPrimaryKey => self.is_primary_key = flag,
                Property::IsRequired => self.is_required = flag,
                Property::IsMultivalued => self.is_multivalued = flag,
                Property::IsDerived => self.is_derived = flag,
                Property::IsComposite => self.is_composite = flag,
                Property::IsSubAttribute => self.is_sub_attribute = flag,
                Property::IsIdentifying => self.is_identifying = flag,
                Property::Nullable => self.nullable = flag,
                Property::IsDeclarative => self.is_declarative = flag,
                _ => return Err(invalid()),
            }
        } else {
            if !value.is_null() && value.as_text().is_none() {
                return Err(invalid());
            }
            let text = value.as_text().map(str::to_string);
            match property {
                Property::Name => self.name = text,
                Property::DataType => self.data_type = text,
                Property::CardinalitySource => self.cardinality_source = text,
                Property::CardinalityTarget => self.cardinality_target = text,
                Property::Cardinality => self.cardinality = text,
                Property::Description => self.description = text,
                Property::Type => self.type_name = text,
                Property::MermaidCardinality => self.mermaid_cardinality = text,
                Property::ErType => {
                    self.er_type = match text {
                        Some(t) => Some(ErType::parse(&t).ok_or_else(invalid)?),
                        None => None,
                    };
                }
                _ => return Err(invalid()),
            }
        }

        self.drop_raw_aliases(property.as_str());
        Ok(())
    }

    fn drop_raw_aliases(&mut self, key: &str) {
        for prefix in RAW_KEY_PREFIXES {
            self.raw_attributes.remove(&format!("{prefix}{key}"));
        }
    }
}

/// A node or connection of the diagram graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(default)]
    pub host_type: String,
    #[serde(default)]
    pub bounds: Bounds,
    #[serde(default)]
    pub business_object: BusinessObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionData>,
}

impl Element {
    #[must_use]
    pub fn shape(id: impl Into<ElementId>, er_type: ErType, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            host_type: format!("er:{}", er_type.as_str()),
            bounds,
            business_object: BusinessObject {
                er_type: Some(er_type),
                ..BusinessObject::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn connection(
        id: impl Into<ElementId>,
        source: impl Into<ElementId>,
        target: impl Into<ElementId>,
        waypoints: Vec<Point>,
    ) -> Self {
        Self {
            id: id.into(),
            host_type: String::from("er:Connection"),
            connection: Some(ConnectionData {
                source: source.into(),
                target: target.into(),
                waypoints,
                kind: ConnectionKind::Standard,
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.business_object.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<ElementId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ConnectionKind) -> Self {
        if let Some(connection) = self.connection.as_mut() {
            connection.kind = kind;
        }
        self
    }

    #[must_use]
    pub const fn is_connection(&self) -> bool {
        self.connection.is_some()
    }

    #[must_use]
    pub fn is_parent_child(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| c.kind == ConnectionKind::ParentChild)
            || self.host_type == "er:ParentChildConnection"
    }

    /// Semantic type: business object, then raw attributes, then the host type tag.
    #[must_use]
    pub fn er_type(&self) -> Option<ErType> {
        if self.is_connection() {
            return None;
        }
        self.business_object.er_type().or_else(|| {
            ErType::parse(&self.host_type).filter(|_| self.host_type.starts_with("er:"))
        })
    }

    #[must_use]
    pub fn waypoints(&self) -> &[Point] {
        self.connection
            .as_ref()
            .map_or(&[][..], |c| c.waypoints.as_slice())
    }
}
