//! Region string encoding.
//!
//! Songs keep their category and recording place in a single `region`
//! column as `"<category>|<place>"`. A missing place is stored as the bare
//! category. Places written as `"."` by older entries are read as absent.

use std::fmt;

/// Separator between category and place inside a region string
pub const REGION_SEPARATOR: char = '|';

/// Decoded form of a region string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    pub category: String,
    pub place: Option<String>,
}

impl Region {
    /// Build a region, normalising a blank or `"."` place to none
    pub fn new(category: impl Into<String>, place: Option<&str>) -> Self {
        Self {
            category: category.into(),
            place: place.filter(|p| !is_blank_place(p)).map(str::to_string),
        }
    }

    /// Split a stored region string into category and place
    pub fn parse(region: &str) -> Self {
        if region.is_empty() {
            return Self::default();
        }

        match region.split_once(REGION_SEPARATOR) {
            Some((category, rest)) => {
                // Anything after a second separator is not part of the place
                let place = rest.split(REGION_SEPARATOR).next().unwrap_or("");
                Self::new(category, Some(place))
            }
            None => Self::new(region, None),
        }
    }

    /// Encode back to the stored `category|place` form
    pub fn encode(&self) -> String {
        match self.place.as_deref() {
            Some(place) if !is_blank_place(place) => {
                format!("{}{}{}", self.category, REGION_SEPARATOR, place)
            }
            _ => self.category.clone(),
        }
    }

    /// Same region with a different category
    pub fn with_category(&self, category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            place: self.place.clone(),
        }
    }

    /// Same region with a different place
    pub fn with_place(&self, place: Option<&str>) -> Self {
        Self::new(self.category.clone(), place)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// True when a category or place would corrupt the encoding
pub fn contains_separator(value: &str) -> bool {
    value.contains(REGION_SEPARATOR)
}

fn is_blank_place(place: &str) -> bool {
    matches!(place.trim(), "" | ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_with_place() {
        let region = Region::new("Свадебные", Some("Село Вятское"));
        assert_eq!(region.encode(), "Свадебные|Село Вятское");
    }

    #[test]
    fn test_encode_dot_place_is_category_only() {
        assert_eq!(Region::new("Колыбельные", Some(".")).encode(), "Колыбельные");
        assert_eq!(Region::new("Колыбельные", Some("  ")).encode(), "Колыбельные");
        assert_eq!(Region::new("Колыбельные", None).encode(), "Колыбельные");
    }

    #[test]
    fn test_parse_round_trip() {
        let region = Region::parse("A|B");
        assert_eq!(region.category, "A");
        assert_eq!(region.place.as_deref(), Some("B"));
        assert_eq!(region.encode(), "A|B");
    }

    #[test]
    fn test_parse_without_separator() {
        let region = Region::parse("Хороводные");
        assert_eq!(region.category, "Хороводные");
        assert_eq!(region.place, None);
    }

    #[test]
    fn test_parse_legacy_dot_and_empty_place() {
        assert_eq!(Region::parse("A|.").place, None);
        assert_eq!(Region::parse("A|").place, None);
        assert_eq!(Region::parse("A| . ").place, None);
        assert_eq!(Region::parse("A|.").category, "A");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Region::parse(""), Region::default());
    }

    #[test]
    fn test_parse_ignores_extra_segments() {
        let region = Region::parse("A|B|C");
        assert_eq!(region.category, "A");
        assert_eq!(region.place.as_deref(), Some("B"));
    }

    #[test]
    fn test_with_category_keeps_place() {
        let region = Region::parse("A|B").with_category("C");
        assert_eq!(region.encode(), "C|B");
    }

    #[test]
    fn test_with_place_dot_drops_place() {
        let region = Region::parse("A|B").with_place(Some("."));
        assert_eq!(region.encode(), "A");
    }

    #[test]
    fn test_contains_separator() {
        assert!(contains_separator("a|b"));
        assert!(!contains_separator("ab"));
    }
}
