//! Bracket placeholder parsing ("1st Pool A", "2nd Pool B", ...).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("Not a pool placement placeholder: {0:?}")]
    Unrecognized(String),

    #[error("Placeholder has no pool label: {0:?}")]
    MissingPool(String),
}

/// A finishing position within a pool, 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ordinal(u8);

impl Ordinal {
    pub fn new(position: u8) -> Option<Self> {
        (1..=4).contains(&position).then_some(Self(position))
    }

    pub fn position(&self) -> u8 {
        self.0
    }

    /// Zero-based index into a pool's ranking.
    pub fn index(&self) -> usize {
        usize::from(self.0 - 1)
    }

    fn from_suffixed(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1st" => Some(Self(1)),
            "2nd" => Some(Self(2)),
            "3rd" => Some(Self(3)),
            "4th" => Some(Self(4)),
            _ => None,
        }
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.0 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        };
        write!(f, "{}{}", self.0, suffix)
    }
}

/// A slot that will be filled by the team finishing `ordinal` in a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub ordinal: Ordinal,
    pub pool_label: String,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(1st|2nd|3rd|4th)\s+(.+?)\s*$").expect("placeholder regex is valid")
    })
}

impl FromStr for Placeholder {
    type Err = PlaceholderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = placeholder_regex()
            .captures(s)
            .ok_or_else(|| PlaceholderError::Unrecognized(s.to_string()))?;

        let ordinal = Ordinal::from_suffixed(&caps[1])
            .ok_or_else(|| PlaceholderError::Unrecognized(s.to_string()))?;
        let pool_label = caps[2].trim().to_string();
        if pool_label.is_empty() {
            return Err(PlaceholderError::MissingPool(s.to_string()));
        }

        Ok(Self {
            ordinal,
            pool_label,
        })
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ordinal, self.pool_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_pool_a() {
        let p: Placeholder = "1st Pool A".parse().unwrap();
        assert_eq!(p.ordinal.position(), 1);
        assert_eq!(p.ordinal.index(), 0);
        assert_eq!(p.pool_label, "Pool A");
    }

    #[test]
    fn test_parse_case_and_whitespace() {
        let p: Placeholder = "  4TH   Pool Blue ".parse().unwrap();
        assert_eq!(p.ordinal.position(), 4);
        assert_eq!(p.pool_label, "Pool Blue");
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert!(matches!(
            "Winner SF1".parse::<Placeholder>(),
            Err(PlaceholderError::Unrecognized(_))
        ));
        assert!("5th Pool A".parse::<Placeholder>().is_err());
        assert!("1st".parse::<Placeholder>().is_err());
        assert!("".parse::<Placeholder>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let p: Placeholder = "3rd pool c".parse().unwrap();
        assert_eq!(p.to_string(), "3rd pool c");
    }

    #[test]
    fn test_ordinal_bounds() {
        assert!(Ordinal::new(0).is_none());
        assert!(Ordinal::new(5).is_none());
        assert_eq!(Ordinal::new(2).unwrap().to_string(), "2nd");
    }
}
