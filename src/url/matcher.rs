use crate::ConfigError;
use regex::Regex;

/// Returns the expression inside a `/…/`-wrapped pattern
///
/// ```
/// use seo_audit::url::regex_body;
///
/// assert_eq!(regex_body("/\\.pdf$/"), Some("\\.pdf$"));
/// assert_eq!(regex_body("/admin"), None);
/// ```
pub fn regex_body(pattern: &str) -> Option<&str> {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}

#[derive(Debug, Clone)]
enum IgnorePattern {
    Literal(String),
    Regex(Regex),
}

/// Compiled set of ignore patterns
///
/// A URL is ignored when any pattern matches it: plain patterns match as a
/// literal substring, patterns wrapped in `/…/` match as a regular expression.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreMatcher {
    /// Compiles the configured patterns
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| match regex_body(p) {
                Some(expr) => Regex::new(expr)
                    .map(IgnorePattern::Regex)
                    .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e))),
                None => Ok(IgnorePattern::Literal(p.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Checks whether a URL should be skipped
    pub fn is_ignored(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            IgnorePattern::Literal(literal) => url.contains(literal.as_str()),
            IgnorePattern::Regex(re) => re.is_match(url),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> IgnoreMatcher {
        let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        IgnoreMatcher::new(&owned).unwrap()
    }

    #[test]
    fn test_literal_substring() {
        let m = matcher(&["/admin"]);
        assert!(m.is_ignored("http://localhost:3000/admin"));
        assert!(m.is_ignored("http://localhost:3000/admin/users"));
        assert!(!m.is_ignored("http://localhost:3000/blog"));
    }

    #[test]
    fn test_regex_pattern() {
        let m = matcher(&["/\\.(pdf|zip)$/"]);
        assert!(m.is_ignored("http://localhost:3000/files/report.pdf"));
        assert!(m.is_ignored("http://localhost:3000/a.zip"));
        assert!(!m.is_ignored("http://localhost:3000/pdf-guide"));
    }

    #[test]
    fn test_any_pattern_matches() {
        let m = matcher(&["/private", "/\\?preview=/"]);
        assert!(m.is_ignored("http://localhost:3000/private"));
        assert!(m.is_ignored("http://localhost:3000/post?preview=1"));
        assert!(!m.is_ignored("http://localhost:3000/post"));
    }

    #[test]
    fn test_single_slash_is_literal() {
        assert_eq!(regex_body("/"), None);
        let m = matcher(&["/"]);
        assert!(m.is_ignored("http://localhost:3000/"));
    }

    #[test]
    fn test_empty_matcher() {
        let m = IgnoreMatcher::default();
        assert!(m.is_empty());
        assert!(!m.is_ignored("http://localhost:3000/anything"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let result = IgnoreMatcher::new(&["/(oops/".to_string()]);
        assert!(matches!(result, Err(ConfigError::InvalidPattern(_))));
    }
}
