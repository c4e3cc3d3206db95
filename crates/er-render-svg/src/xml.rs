//! Number formatting, escaping and attribute storage for serialized SVG.

use std::borrow::Cow;

/// Shortest stable form of a coordinate: whole numbers lose the fraction,
/// everything else keeps two decimals.
#[must_use]
pub fn fmt_num(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        (rounded as i64).to_string()
    } else {
        format!("{rounded:.2}")
    }
}

/// Escape `raw` for XML. Quotes are only touched inside attribute values.
#[must_use]
pub fn escape_xml(raw: &str, in_attribute: bool) -> Cow<'_, str> {
    let needs = |c: char| matches!(c, '&' | '<' | '>') || (in_attribute && matches!(c, '"' | '\''));
    if !raw.contains(needs) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            '\'' if in_attribute => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Attributes in insertion order. Values are stored unescaped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, keeping its original position when it already exists.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name.to_owned(), value)),
        }
    }

    pub fn set_num(&mut self, name: &str, value: f64) {
        self.set(name, fmt_num(value));
    }

    pub fn add_class(&mut self, class: &str) {
        match self.0.iter_mut().find(|(key, _)| key == "class") {
            Some((_, classes)) if !classes.is_empty() => {
                classes.push(' ');
                classes.push_str(class);
            }
            _ => self.set("class", class),
        }
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Drop `name`; `true` when it was set.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(index) = self.0.iter().position(|(key, _)| key == name) else {
            return false;
        };
        self.0.remove(index);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn write_into(&self, out: &mut String) {
        for (name, value) in &self.0 {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_xml(value, true));
            out.push('"');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(attrs: &Attributes) -> String {
        let mut out = String::new();
        attrs.write_into(&mut out);
        out
    }

    #[test]
    fn numbers_drop_whole_fractions() {
        assert_eq!(fmt_num(182.0), "182");
        assert_eq!(fmt_num(-20.0), "-20");
        assert_eq!(fmt_num(2.5), "2.50");
        assert_eq!(fmt_num(9.999), "10");
        assert_eq!(fmt_num(-0.0), "0");
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut attrs = Attributes::new();
        attrs.set("fill", "#FFF3E0");
        attrs.set_num("x", 10.0);
        attrs.set("fill", "none");
        assert_eq!(rendered(&attrs), r#" fill="none" x="10""#);
    }

    #[test]
    fn classes_accumulate() {
        let mut attrs = Attributes::new();
        attrs.add_class("er-outline");
        attrs.add_class("djs-outline");
        assert_eq!(attrs.get("class"), Some("er-outline djs-outline"));
        assert!(attrs.has_class("djs-outline"));
        assert!(!attrs.has_class("djs"));
    }

    #[test]
    fn remove_reports_whether_it_was_set() {
        let mut attrs = Attributes::new();
        attrs.set("marker-end", "url(#arrow)");
        assert!(attrs.remove("marker-end"));
        assert!(!attrs.remove("marker-end"));
        assert!(attrs.is_empty());
    }

    #[test]
    fn quotes_are_escaped_only_in_attributes() {
        assert_eq!(escape_xml(r#"A & "B""#, true), "A &amp; &quot;B&quot;");
        assert_eq!(escape_xml(r#"<PK> "id""#, false), r#"&lt;PK&gt; "id""#);
        assert!(matches!(escape_xml("Pedido", true), Cow::Borrowed(_)));
    }
}
