//! Robots.txt parser and rule evaluation
//!
//! Rules are grouped per `User-agent:` block. Path permission is resolved by
//! longest match: among the selected agent's allow and disallow patterns, the
//! longest pattern matching the path decides the verdict.

use regex::Regex;

/// Agent whose rules take precedence over the wildcard group
const PREFERRED_AGENT: &str = "googlebot";

/// One allow or disallow pattern, compiled when the file is parsed
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Literal prefix
    Prefix,
    /// Pattern with `*` or a trailing `$`
    Expr(Regex),
    /// Pattern that failed to compile; never matches
    Never,
}

impl PathPattern {
    /// Compiles a robots pattern
    ///
    /// Patterns without `*` or a trailing `$` match as a literal prefix.
    /// Otherwise `*` becomes `.*`, everything else is escaped, and the
    /// expression is anchored at the start of the path.
    pub fn new(raw: &str) -> Self {
        let matcher = if !raw.contains('*') && !raw.ends_with('$') {
            Matcher::Prefix
        } else {
            match Regex::new(&pattern_expr(raw)) {
                Ok(re) => Matcher::Expr(re),
                Err(e) => {
                    tracing::debug!("Ignoring unusable robots pattern {}: {}", raw, e);
                    Matcher::Never
                }
            }
        };

        Self {
            raw: raw.to_string(),
            matcher,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            Matcher::Prefix => path.starts_with(&self.raw),
            Matcher::Expr(re) => re.is_match(path),
            Matcher::Never => false,
        }
    }

    /// Specificity used for longest-match resolution
    fn specificity(&self) -> usize {
        self.raw.chars().count()
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PathPattern {}

/// Allow/disallow patterns for one `User-agent:` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRule {
    /// Lowercased user agent token
    pub user_agent: String,
    pub allow: Vec<PathPattern>,
    pub disallow: Vec<PathPattern>,
}

/// Parsed robots.txt content
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    rules: Vec<RobotsRule>,
}

impl RobotsRules {
    /// Rules that allow everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses raw robots.txt content
    ///
    /// Keys are case-insensitive, `#` comments and blank lines are skipped.
    /// Consecutive `User-agent:` lines share the directives that follow them.
    /// An empty `Disallow:` value allows everything and is dropped.
    pub fn parse(content: &str) -> Self {
        let mut rules: Vec<RobotsRule> = Vec::new();
        let mut group: Vec<usize> = Vec::new();
        let mut group_has_directives = false;

        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if group_has_directives {
                        group.clear();
                        group_has_directives = false;
                    }
                    rules.push(RobotsRule {
                        user_agent: value.to_lowercase(),
                        ..Default::default()
                    });
                    group.push(rules.len() - 1);
                }
                "allow" | "disallow" => {
                    group_has_directives = true;
                    if value.is_empty() {
                        continue;
                    }
                    let pattern = PathPattern::new(value);
                    for &idx in &group {
                        let rule = &mut rules[idx];
                        if key == "allow" {
                            rule.allow.push(pattern.clone());
                        } else {
                            rule.disallow.push(pattern.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        Self { rules }
    }

    /// All parsed rule blocks
    pub fn rules(&self) -> &[RobotsRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks whether a path is disallowed for the crawler
    ///
    /// Uses the `googlebot` blocks when present, otherwise the `*` blocks.
    /// The longest matching pattern wins; on a tie between an allow and a
    /// disallow pattern of the same length, allow wins. No match means allowed.
    pub fn is_disallowed(&self, path: &str) -> bool {
        let selected = self.rules_for(PREFERRED_AGENT);
        let selected = if selected.is_empty() {
            self.rules_for("*")
        } else {
            selected
        };

        let mut best: Option<(usize, bool)> = None;

        for rule in selected {
            for (patterns, disallow) in [(&rule.allow, false), (&rule.disallow, true)] {
                for pattern in patterns {
                    if !pattern.matches(path) {
                        continue;
                    }
                    let len = pattern.specificity();
                    best = match best {
                        Some((best_len, _)) if len > best_len => Some((len, disallow)),
                        Some((best_len, best_disallow)) if len == best_len => {
                            Some((len, best_disallow && disallow))
                        }
                        None => Some((len, disallow)),
                        keep => keep,
                    };
                }
            }
        }

        best.map(|(_, disallow)| disallow).unwrap_or(false)
    }

    fn rules_for(&self, agent: &str) -> Vec<&RobotsRule> {
        self.rules
            .iter()
            .filter(|rule| rule.user_agent == agent)
            .collect()
    }
}

/// Translates a wildcard robots pattern into an anchored regular expression
fn pattern_expr(pattern: &str) -> String {
    let (body, anchored_end) = match pattern.strip_suffix('$') {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    let mut expr = String::from("^");
    for (i, part) in body.split('*').enumerate() {
        if i > 0 {
            expr.push_str(".*");
        }
        expr.push_str(&regex::escape(part));
    }
    if anchored_end {
        expr.push('$');
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(patterns: &[PathPattern]) -> Vec<&str> {
        patterns.iter().map(PathPattern::as_str).collect()
    }

    #[test]
    fn test_allow_all() {
        let robots = RobotsRules::allow_all();
        assert!(!robots.is_disallowed("/any/path"));
        assert!(!robots.is_disallowed("/admin"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /");
        assert!(robots.is_disallowed("/"));
        assert!(robots.is_disallowed("/page"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /admin");
        assert!(!robots.is_disallowed("/"));
        assert!(!robots.is_disallowed("/page"));
        assert!(robots.is_disallowed("/admin"));
        assert!(robots.is_disallowed("/admin/users"));
    }

    #[test]
    fn test_longest_match_wins() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /a\nAllow: /a/b");
        assert!(!robots.is_disallowed("/a/b/c"));
        assert!(robots.is_disallowed("/a/x"));
        assert!(robots.is_disallowed("/a"));
    }

    #[test]
    fn test_longer_disallow_overrides_allow() {
        let robots = RobotsRules::parse("User-agent: *\nAllow: /docs\nDisallow: /docs/internal");
        assert!(!robots.is_disallowed("/docs/guide"));
        assert!(robots.is_disallowed("/docs/internal/notes"));
    }

    #[test]
    fn test_equal_length_tie_allows() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /page\nAllow: /page");
        assert!(!robots.is_disallowed("/page"));
    }

    #[test]
    fn test_googlebot_rules_preferred() {
        let content = "User-agent: *\nDisallow: /\n\nUser-agent: Googlebot\nDisallow: /private";
        let robots = RobotsRules::parse(content);
        assert!(!robots.is_disallowed("/public"));
        assert!(robots.is_disallowed("/private"));
    }

    #[test]
    fn test_other_agents_ignored() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = RobotsRules::parse(content);
        assert!(!robots.is_disallowed("/page"));
    }

    #[test]
    fn test_wildcard_pattern() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /*.pdf$\nDisallow: /tmp*/cache");
        assert!(robots.is_disallowed("/files/report.pdf"));
        assert!(!robots.is_disallowed("/files/report.pdf.html"));
        assert!(robots.is_disallowed("/tmp-1/cache/x"));
        assert!(!robots.is_disallowed("/cache"));
    }

    #[test]
    fn test_pattern_metacharacters_escaped() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /search?q=*");
        assert!(robots.is_disallowed("/search?q=rust"));
        assert!(!robots.is_disallowed("/searchXq=rust"));
    }

    #[test]
    fn test_comments_blank_lines_and_case() {
        let content = "# robots for the site\n\nUSER-AGENT: *   # everyone\n\nDISALLOW: /secret # hidden\n";
        let robots = RobotsRules::parse(content);
        assert_eq!(robots.rules().len(), 1);
        assert!(robots.is_disallowed("/secret"));
    }

    #[test]
    fn test_multiple_blocks_and_directives() {
        let content = "User-agent: *\nDisallow: /a\nDisallow: /b\nAllow: /b/open\n\nUser-agent: otherbot\nDisallow: /c";
        let robots = RobotsRules::parse(content);
        assert_eq!(robots.rules().len(), 2);
        assert_eq!(raw(&robots.rules()[0].disallow), vec!["/a", "/b"]);
        assert_eq!(raw(&robots.rules()[0].allow), vec!["/b/open"]);
        assert_eq!(robots.rules()[1].user_agent, "otherbot");
    }

    #[test]
    fn test_grouped_user_agents_share_directives() {
        let content = "User-agent: googlebot\nUser-agent: *\nDisallow: /shared";
        let robots = RobotsRules::parse(content);
        assert_eq!(robots.rules().len(), 2);
        assert_eq!(raw(&robots.rules()[0].disallow), vec!["/shared"]);
        assert_eq!(raw(&robots.rules()[1].disallow), vec!["/shared"]);
    }

    #[test]
    fn test_patterns_compiled_once() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow: /*.json$\nAllow: /api");
        let rule = &robots.rules()[0];
        assert!(matches!(rule.disallow[0].matcher, Matcher::Expr(_)));
        assert!(matches!(rule.allow[0].matcher, Matcher::Prefix));

        assert!(rule.disallow[0].matches("/data/feed.json"));
        assert!(!rule.disallow[0].matches("/data/feed.json.gz"));
        assert!(robots.is_disallowed("/data/feed.json"));
    }

    #[test]
    fn test_empty_disallow_allows_everything() {
        let robots = RobotsRules::parse("User-agent: *\nDisallow:");
        assert!(!robots.is_disallowed("/anything"));
    }

    #[test]
    fn test_invalid_robots_txt() {
        let robots = RobotsRules::parse("This is not valid robots.txt {{{");
        assert!(robots.is_empty());
        assert!(!robots.is_disallowed("/any/path"));
    }
}
