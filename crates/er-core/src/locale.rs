use serde::{Deserialize, Serialize};

use crate::cardinality::{CardinalityNotation, Multiplicity, Optionality};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

/// Placeholder labels and cardinality phrases for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleLabels {
    pub entity: &'static str,
    pub weak_entity: &'static str,
    pub relationship: &'static str,
    pub attribute: &'static str,
    pub composite_attribute: &'static str,
    pub sub_attribute: &'static str,
    pub exactly_one: &'static str,
    pub zero_or_one: &'static str,
    pub zero_or_many: &'static str,
    pub one_or_many: &'static str,
}

const PT_BR: LocaleLabels = LocaleLabels {
    entity: "Entidade",
    weak_entity: "Entidade Fraca",
    relationship: "Relacionamento",
    attribute: "Atributo",
    composite_attribute: "Atributo Composto",
    sub_attribute: "Subatributo",
    exactly_one: "exatamente um",
    zero_or_one: "zero ou um",
    zero_or_many: "zero ou muitos",
    one_or_many: "um ou muitos",
};

const EN: LocaleLabels = LocaleLabels {
    entity: "Entity",
    weak_entity: "Weak Entity",
    relationship: "Relationship",
    attribute: "Attribute",
    composite_attribute: "Composite Attribute",
    sub_attribute: "Sub-attribute",
    exactly_one: "exactly one",
    zero_or_one: "zero or one",
    zero_or_many: "zero or many",
    one_or_many: "one or many",
};

impl Locale {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PtBr => "pt-br",
            Self::En => "en",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" | "pt" => Some(Self::PtBr),
            "en" | "en-us" | "en-gb" => Some(Self::En),
            _ => None,
        }
    }

    #[must_use]
    pub const fn labels(self) -> &'static LocaleLabels {
        match self {
            Self::PtBr => &PT_BR,
            Self::En => &EN,
        }
    }
}

impl LocaleLabels {
    #[must_use]
    pub const fn phrase(&self, notation: CardinalityNotation) -> &'static str {
        match (notation.optionality, notation.multiplicity) {
            (Optionality::Mandatory, Multiplicity::One) => self.exactly_one,
            (Optionality::Optional, Multiplicity::One) => self.zero_or_one,
            (Optionality::Optional, Multiplicity::Many) => self.zero_or_many,
            (Optionality::Mandatory, Multiplicity::Many) => self.one_or_many,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Locale;

    #[test]
    fn default_locale_is_portuguese() {
        assert_eq!(Locale::default().labels().weak_entity, "Entidade Fraca");
        assert_eq!(Locale::parse("EN_us"), Some(Locale::En));
        assert_eq!(Locale::parse("fr"), None);
    }
}
