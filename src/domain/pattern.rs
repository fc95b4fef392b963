use std::fmt;

use super::SearchError;

// namegrep's dialect is not `regex` syntax, so the pattern stays opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
    pub fn parse(raw: &str) -> Result<Pattern, SearchError> {
        let trimmed = raw.trim();
        match trimmed.is_empty() {
            true => Err(SearchError::InvalidInput(
                "regexPattern is required".to_string(),
            )),
            false => Ok(Pattern(trimmed.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Pattern {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Pattern;
    use crate::domain::SearchError;

    #[test]
    fn parse_pattern_valid() {
        let pattern = Pattern::parse("  ^shop[a-z]{2}$ ").unwrap();
        assert_eq!(pattern.as_str(), "^shop[a-z]{2}$");
    }

    #[test]
    fn parse_pattern_invalid() {
        for raw in ["", "   ", "\n\t"] {
            assert!(matches!(
                Pattern::parse(raw),
                Err(SearchError::InvalidInput(_))
            ));
        }
    }
}
