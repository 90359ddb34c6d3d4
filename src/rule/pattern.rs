//! Compiled predicate patterns.

use crate::error::{Result, TransformError};
use crate::interpolate::CaptureGroups;
use aho_corasick::AhoCorasick;
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};

// Threshold for switching between a plain substring scan and AhoCorasick
const AHOCORASICK_THRESHOLD: usize = 20;

fn anchored(source: &str) -> String {
    format!(r"\A(?:{source})\z")
}

/// A regex that only ever matches the whole haystack.
///
/// Embedded newlines are stripped from the source so that long alternations
/// can be written across several lines in rule files.
#[derive(Debug, Clone)]
pub struct FullMatchPattern {
    source: String,
    regex: Regex,
}

impl FullMatchPattern {
    pub(crate) fn compile(
        rule: usize,
        field: &'static str,
        raw: &str,
        case_insensitive: bool,
    ) -> Result<Self> {
        let source = raw.replace('\n', "");
        let regex = RegexBuilder::new(&anchored(&source))
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| TransformError::InvalidRegex {
                rule,
                field,
                source,
            })?;
        Ok(Self { source, regex })
    }

    /// Pattern source without anchoring.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    pub fn captures(&self, haystack: &str) -> Option<CaptureGroups> {
        self.regex
            .captures(haystack)
            .map(|caps| CaptureGroups::from_captures(&caps))
    }

    /// Number of groups including the implicit whole-match group 0.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len()
    }
}

/// Union of several full-match patterns evaluated in a single pass.
#[derive(Debug, Clone)]
pub struct PatternUnion {
    set: RegexSet,
}

impl PatternUnion {
    /// Build the union. `size_limit` bounds the compiled program and the
    /// lazy DFA cache alike.
    pub(crate) fn new<'a, I>(sources: I, size_limit: usize) -> std::result::Result<Self, regex::Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set = RegexSetBuilder::new(sources.into_iter().map(anchored))
            .size_limit(size_limit)
            .dfa_size_limit(size_limit)
            .build()?;
        Ok(Self { set })
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.set.is_match(haystack)
    }
}

/// Any-of substring test over lowercased needles.
///
/// Uses a plain scan for small sets and an AhoCorasick automaton for large
/// ones.
#[derive(Debug, Clone)]
pub struct SubstringSet {
    parts: Vec<String>,
    automaton: Option<AhoCorasick>,
}

impl SubstringSet {
    pub(crate) fn new(parts: Vec<String>) -> Self {
        let parts: Vec<String> = parts.into_iter().map(|p| p.to_lowercase()).collect();
        // Fall back to the plain scan if the automaton cannot be built
        let automaton = if parts.len() >= AHOCORASICK_THRESHOLD {
            AhoCorasick::new(&parts).ok()
        } else {
            None
        };
        Self { parts, automaton }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Whether any part occurs in `haystack`, ignoring case.
    pub fn matches(&self, haystack: &str) -> bool {
        let haystack = haystack.to_lowercase();
        match &self.automaton {
            Some(automaton) => automaton.is_match(&haystack),
            None => self.parts.iter().any(|part| haystack.contains(part.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COVERING_REGEX_SIZE_LIMIT;

    #[test]
    fn test_full_match_only() {
        let pattern = FullMatchPattern::compile(0, "namepat", "lib(.*)", false).unwrap();
        assert!(pattern.is_match("libfoo"));
        assert!(!pattern.is_match("xlibfoo"));
        assert_eq!(pattern.group_count(), 2);

        let groups = pattern.captures("libfoo").unwrap();
        assert_eq!(groups.get(1), Some("foo"));
    }

    #[test]
    fn test_alternation_is_fully_anchored() {
        let pattern = FullMatchPattern::compile(0, "namepat", "foo|bar", false).unwrap();
        assert!(pattern.is_match("foo"));
        assert!(pattern.is_match("bar"));
        assert!(!pattern.is_match("foobar"));
        assert!(!pattern.is_match("barx"));
    }

    #[test]
    fn test_newlines_are_stripped() {
        let pattern = FullMatchPattern::compile(0, "namepat", "foo|\nbar|\nbaz", false).unwrap();
        assert_eq!(pattern.source(), "foo|bar|baz");
        assert!(pattern.is_match("baz"));
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = FullMatchPattern::compile(0, "verpat", "[0-9]+RC[0-9]+", true).unwrap();
        assert!(pattern.is_match("1rc2"));
        let sensitive = FullMatchPattern::compile(0, "namepat", "Foo", false).unwrap();
        assert!(!sensitive.is_match("foo"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = FullMatchPattern::compile(4, "wwwpat", "(", false).unwrap_err();
        assert_eq!(err.rule_number(), Some(4));
        assert!(matches!(err, TransformError::InvalidRegex { field: "wwwpat", .. }));
    }

    #[test]
    fn test_pattern_union() {
        let union = PatternUnion::new(["lib(.*)", "py-(.*)"], DEFAULT_COVERING_REGEX_SIZE_LIMIT).unwrap();
        assert_eq!(union.len(), 2);
        assert!(union.is_match("libfoo"));
        assert!(union.is_match("py-bar"));
        assert!(!union.is_match("foo"));
    }

    #[test]
    fn test_pattern_union_allows_repeated_group_names() {
        let union = PatternUnion::new(["(?P<n>a+)", "(?P<n>b+)"], DEFAULT_COVERING_REGEX_SIZE_LIMIT)
            .unwrap();
        assert!(union.is_match("bbb"));
    }

    #[test]
    fn test_pattern_union_thousands_of_patterns() {
        let sources: Vec<String> = (0..5_000).map(|i| format!(r"py[0-9]+-mod{i}-(\w+)")).collect();
        let union = PatternUnion::new(sources.iter().map(String::as_str), DEFAULT_COVERING_REGEX_SIZE_LIMIT)
            .unwrap();
        assert_eq!(union.len(), 5_000);
        assert!(union.is_match("py311-mod4321-extra"));
        assert!(!union.is_match("py311-mod5000-extra"));
    }

    #[test]
    fn test_pattern_union_respects_size_limit() {
        assert!(PatternUnion::new([r"\w+-(.*)"], 64).is_err());
    }

    #[test]
    fn test_substring_set_small() {
        let set = SubstringSet::new(vec!["GitHub.com".to_string(), "gitlab".to_string()]);
        assert_eq!(set.parts(), &["github.com".to_string(), "gitlab".to_string()]);
        assert!(set.matches("https://GITHUB.COM/foo/bar"));
        assert!(!set.matches("https://example.org/"));
    }

    #[test]
    fn test_substring_set_large_uses_automaton() {
        let parts: Vec<String> = (0..30).map(|i| format!("host{i}.example")).collect();
        let set = SubstringSet::new(parts);
        assert!(set.automaton.is_some());
        assert!(set.matches("http://HOST17.example/path"));
        assert!(!set.matches("http://host.example/"));
    }
}
