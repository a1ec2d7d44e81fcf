//! Dotted field paths with positional wildcards.

use std::fmt;
use std::str::FromStr;

/// Marker standing for "an array index at this position".
pub const WILDCARD: &str = "#";

/// One segment of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A literal name (or a literal index such as `2`).
    Name(String),
    /// Any array index.
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == WILDCARD {
            Self::Wildcard
        } else {
            Self::Name(raw.to_string())
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// An expected field, such as `"user.email"` or `"items.#.name"`.
///
/// The empty path is the "fieldless" path: it stands for errors about the
/// input as a whole rather than about one of its fields.
///
/// # Example
///
/// ```
/// use gauntlet_validation::FieldPath;
///
/// let fields = vec!["items".to_string(), "#".to_string(), "name".to_string()];
///
/// assert!(FieldPath::parse("items.2.name").matches(&fields, &[2]));
/// assert!(!FieldPath::parse("items.3.name").matches(&fields, &[2]));
/// assert!(FieldPath::parse("items.#.name").matches(&fields, &[7]));
/// assert!(FieldPath::parse("").matches(&[], &[]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parses a dotted path. The empty string yields the fieldless path.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::fieldless();
        }
        Self {
            segments: path.split('.').map(Segment::parse).collect(),
        }
    }

    /// The path of errors that are not attached to any field.
    pub fn fieldless() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Returns true for the fieldless path.
    pub fn is_fieldless(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Compares this path with a decoded error location.
    ///
    /// `fields` holds the error's segments, where `#` marks an array position;
    /// each `#` consumes the next entry of `indexes`, left to right. The
    /// fieldless path matches only an empty `fields`.
    pub fn matches(&self, fields: &[String], indexes: &[usize]) -> bool {
        if fields.is_empty() {
            return self.is_fieldless();
        }

        if fields.len() != self.segments.len() {
            return false;
        }

        let mut cursor = 0;
        for (actual, expected) in fields.iter().zip(&self.segments) {
            if actual == WILDCARD {
                let Some(index) = indexes.get(cursor) else {
                    return false;
                };
                cursor += 1;
                if let Segment::Name(name) = expected {
                    if *name != index.to_string() {
                        return false;
                    }
                }
            } else {
                match expected {
                    Segment::Name(name) if name == actual => {}
                    _ => return false,
                }
            }
        }

        true
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse() {
        let path = FieldPath::parse("items.#.name");
        assert_eq!(
            path.segments(),
            &[
                Segment::Name("items".to_string()),
                Segment::Wildcard,
                Segment::Name("name".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "items.#.name");
    }

    #[test]
    fn test_parse_empty_is_fieldless() {
        let path = FieldPath::parse("");
        assert!(path.is_fieldless());
        assert_eq!(path, FieldPath::fieldless());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn test_literal_match() {
        let actual = fields(&["user", "email"]);
        assert!(FieldPath::parse("user.email").matches(&actual, &[]));
        assert!(!FieldPath::parse("user.name").matches(&actual, &[]));
    }

    #[test]
    fn test_length_mismatch() {
        let actual = fields(&["user", "email"]);
        assert!(!FieldPath::parse("user").matches(&actual, &[]));
        assert!(!FieldPath::parse("user.email.domain").matches(&actual, &[]));
    }

    #[test]
    fn test_index_substitution() {
        let actual = fields(&["items", "#", "name"]);
        assert!(FieldPath::parse("items.2.name").matches(&actual, &[2]));
        assert!(!FieldPath::parse("items.2.name").matches(&actual, &[3]));
    }

    #[test]
    fn test_cursor_advances_per_wildcard() {
        let actual = fields(&["orders", "#", "lines", "#", "sku"]);
        assert!(FieldPath::parse("orders.1.lines.4.sku").matches(&actual, &[1, 4]));
        assert!(!FieldPath::parse("orders.4.lines.1.sku").matches(&actual, &[1, 4]));
        assert!(!FieldPath::parse("orders.1.lines.1.sku").matches(&actual, &[1, 4]));
    }

    #[test]
    fn test_expected_wildcard_matches_any_index() {
        let actual = fields(&["items", "#", "name"]);
        assert!(FieldPath::parse("items.#.name").matches(&actual, &[0]));
        assert!(FieldPath::parse("items.#.name").matches(&actual, &[41]));
    }

    #[test]
    fn test_expected_wildcard_needs_actual_wildcard() {
        let actual = fields(&["items", "2", "name"]);
        assert!(!FieldPath::parse("items.#.name").matches(&actual, &[]));
        assert!(FieldPath::parse("items.2.name").matches(&actual, &[]));
    }

    #[test]
    fn test_hash_is_not_literal() {
        let actual = fields(&["items", "#"]);
        assert!(!FieldPath::parse("items.5").matches(&actual, &[4]));
        assert!(FieldPath::parse("items.4").matches(&actual, &[4]));
    }

    #[test]
    fn test_missing_index_never_matches() {
        let actual = fields(&["items", "#"]);
        assert!(!FieldPath::parse("items.0").matches(&actual, &[]));
    }

    #[test]
    fn test_fieldless() {
        let actual = fields(&["name"]);
        assert!(FieldPath::fieldless().matches(&[], &[]));
        assert!(!FieldPath::fieldless().matches(&actual, &[]));
        assert!(!FieldPath::parse("name").matches(&[], &[]));
    }

    proptest! {
        #[test]
        fn prop_segment_count_mismatch_never_matches(
            expected in prop::collection::vec("[a-z#0-9]{1,6}", 1..6),
            actual in prop::collection::vec("[a-z#]{1,6}", 1..6),
            indexes in prop::collection::vec(0usize..20, 0..6),
        ) {
            prop_assume!(expected.len() != actual.len());
            let path = FieldPath::parse(&expected.join("."));
            prop_assert!(!path.matches(&actual, &indexes));
        }

        #[test]
        fn prop_concrete_path_matches_itself(
            names in prop::collection::vec("[a-z]{1,6}", 1..6),
        ) {
            let path = FieldPath::parse(&names.join("."));
            prop_assert!(path.matches(&names, &[]));
        }

        #[test]
        fn prop_substituted_wildcards_match(
            names in prop::collection::vec("[a-z]{1,6}", 1..5),
            indexes in prop::collection::vec(0usize..1000, 1..5),
        ) {
            // interleave: name.#.name.#...
            let mut actual = Vec::new();
            let mut expected = Vec::new();
            for (name, index) in names.iter().zip(&indexes) {
                actual.push(name.clone());
                actual.push(WILDCARD.to_string());
                expected.push(name.clone());
                expected.push(index.to_string());
            }
            let used = names.len().min(indexes.len());
            let path = FieldPath::parse(&expected.join("."));
            prop_assert!(path.matches(&actual, &indexes[..used]));
        }
    }
}
