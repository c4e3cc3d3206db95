use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Optionality {
    Mandatory,
    Optional,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    One,
    Many,
}

/// The (optionality, multiplicity) pair that selects a crow's-foot symbol cluster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CardinalityNotation {
    pub optionality: Optionality,
    pub multiplicity: Multiplicity,
}

impl CardinalityNotation {
    #[must_use]
    pub const fn new(optionality: Optionality, multiplicity: Multiplicity) -> Self {
        Self {
            optionality,
            multiplicity,
        }
    }
}

/// Canonical cardinality value in range notation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Cardinality {
    #[serde(rename = "0..1")]
    ZeroOne,
    #[serde(rename = "1..1")]
    OneOne,
    #[serde(rename = "0..N")]
    ZeroMany,
    #[serde(rename = "1..N")]
    OneMany,
}

impl Cardinality {
    /// The fixed option order offered to editors.
    pub const ALL: [Self; 4] = [Self::ZeroOne, Self::OneOne, Self::ZeroMany, Self::OneMany];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZeroOne => "0..1",
            Self::OneOne => "1..1",
            Self::ZeroMany => "0..N",
            Self::OneMany => "1..N",
        }
    }

    /// Strict parse of a canonical value. The upper bound is case-insensitive.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "0..1" => Some(Self::ZeroOne),
            "1..1" => Some(Self::OneOne),
            "0..N" | "0..n" => Some(Self::ZeroMany),
            "1..N" | "1..n" => Some(Self::OneMany),
            _ => None,
        }
    }

    #[must_use]
    pub const fn notation(self) -> CardinalityNotation {
        match self {
            Self::ZeroOne => CardinalityNotation::new(Optionality::Optional, Multiplicity::One),
            Self::OneOne => CardinalityNotation::new(Optionality::Mandatory, Multiplicity::One),
            Self::ZeroMany => CardinalityNotation::new(Optionality::Optional, Multiplicity::Many),
            Self::OneMany => CardinalityNotation::new(Optionality::Mandatory, Multiplicity::Many),
        }
    }

    #[must_use]
    pub const fn from_notation(notation: CardinalityNotation) -> Self {
        match (notation.optionality, notation.multiplicity) {
            (Optionality::Optional, Multiplicity::One) => Self::ZeroOne,
            (Optionality::Mandatory, Multiplicity::One) => Self::OneOne,
            (Optionality::Optional, Multiplicity::Many) => Self::ZeroMany,
            (Optionality::Mandatory, Multiplicity::Many) => Self::OneMany,
        }
    }

    /// Lower and upper bound as shown in Chen `(min,max)` labels.
    #[must_use]
    pub const fn bounds(self) -> (&'static str, &'static str) {
        match self {
            Self::ZeroOne => ("0", "1"),
            Self::OneOne => ("1", "1"),
            Self::ZeroMany => ("0", "N"),
            Self::OneMany => ("1", "N"),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MANY_TOKENS: [&str; 8] = ["n", "N", "many", "muitos", "∞", "m", "..n", "..N"];

fn has_upper_n(text: &str) -> bool {
    text.contains('N') || text.contains('n')
}

/// Map free-text cardinality to a notation pair.
///
/// Exact canonical values win, then the `1..`/`0..` range forms with an N
/// upper bound, then a loose fallback over leading zeros and "many" tokens.
#[must_use]
pub fn normalize_cardinality(text: &str) -> CardinalityNotation {
    let value = text.trim();
    match value {
        "1..1" => return CardinalityNotation::new(Optionality::Mandatory, Multiplicity::One),
        "0..1" => return CardinalityNotation::new(Optionality::Optional, Multiplicity::One),
        _ => {}
    }

    if value.contains("1..") && has_upper_n(value) {
        return CardinalityNotation::new(Optionality::Mandatory, Multiplicity::Many);
    }
    if value.contains("0..") && has_upper_n(value) {
        return CardinalityNotation::new(Optionality::Optional, Multiplicity::Many);
    }

    let optionality = if value.starts_with('0') || value.contains("0..") || value.contains("0,") {
        Optionality::Optional
    } else {
        Optionality::Mandatory
    };
    let multiplicity = if MANY_TOKENS.iter().any(|token| value.contains(token)) {
        Multiplicity::Many
    } else {
        Multiplicity::One
    };
    CardinalityNotation::new(optionality, multiplicity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn canonical_values_decompose() {
        assert_eq!(
            normalize_cardinality("1..1"),
            CardinalityNotation::new(Optionality::Mandatory, Multiplicity::One)
        );
        assert_eq!(
            normalize_cardinality("0..1"),
            CardinalityNotation::new(Optionality::Optional, Multiplicity::One)
        );
        assert_eq!(
            normalize_cardinality("1..N"),
            CardinalityNotation::new(Optionality::Mandatory, Multiplicity::Many)
        );
        assert_eq!(
            normalize_cardinality("0..n"),
            CardinalityNotation::new(Optionality::Optional, Multiplicity::Many)
        );
    }

    #[test]
    fn loose_forms_use_fallback_rules() {
        use Multiplicity::{Many, One};
        use Optionality::{Mandatory, Optional};
        let cases = [
            ("(0,N)", Optional, Many),
            ("muitos", Mandatory, Many),
            ("0", Optional, One),
            ("1", Mandatory, One),
            ("1..∞", Mandatory, Many),
        ];
        for (raw, optionality, multiplicity) in cases {
            let notation = normalize_cardinality(raw);
            assert_eq!(notation.optionality, optionality, "{raw}");
            assert_eq!(notation.multiplicity, multiplicity, "{raw}");
        }
    }

    #[test]
    fn strict_parse_rejects_loose_forms() {
        assert_eq!(Cardinality::parse(" 1..n "), Some(Cardinality::OneMany));
        assert_eq!(Cardinality::parse("1"), None);
        assert_eq!(Cardinality::parse(""), None);
    }

    #[test]
    fn serde_uses_range_strings() {
        let json = serde_json::to_string(&Cardinality::ZeroMany).expect("serialize");
        assert_eq!(json, "\"0..N\"");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_canonical_values_are_fixed_points(index in 0usize..4) {
            let value = Cardinality::ALL[index];
            let pair = normalize_cardinality(value.as_str());
            prop_assert_eq!(pair, value.notation());
            let again = normalize_cardinality(Cardinality::from_notation(pair).as_str());
            prop_assert_eq!(again, pair);
        }

        #[test]
        fn prop_normalize_total_on_arbitrary_text(text in ".{0,24}") {
            let pair = normalize_cardinality(&text);
            let canonical = Cardinality::from_notation(pair);
            prop_assert!(Cardinality::ALL.contains(&canonical));
        }
    }
}
