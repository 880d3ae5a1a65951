//! File-name glob filter.
//!
//! Only `*` and `?` carry glob meaning; everything else is literal.
//! The pattern is translated to an anchored regex once, at construction.

use regex::Regex;
use std::path::Path;

/// Glob filter applied to file names (not full paths).
#[derive(Debug, Clone)]
pub struct GlobFilter {
    re: Regex,
}

impl GlobFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut re = String::with_capacity(pattern.len() + 8);
        re.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => re.push_str("[^/]*"),
                '?' => re.push('.'),
                c => re.push_str(&regex::escape(&c.to_string())),
            }
        }
        re.push('$');
        Ok(Self {
            re: Regex::new(&re)?,
        })
    }

    /// Match-all filter.
    pub fn any() -> Self {
        // "*" cannot fail to compile
        Self::new("*").unwrap_or_else(|_| unreachable!())
    }

    /// Whether the path's file name matches the pattern.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.re.is_match(name))
    }
}

impl Default for GlobFilter {
    fn default() -> Self {
        Self::any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_glob() {
        let filter = GlobFilter::new("*.puml").unwrap();
        assert!(filter.matches(&PathBuf::from("/watched/flow.puml")));
        assert!(filter.matches(&PathBuf::from("a.puml")));
        assert!(!filter.matches(&PathBuf::from("/watched/flow.txt")));
        assert!(!filter.matches(&PathBuf::from("/watched/flow.puml.bak")));
    }

    #[test]
    fn test_question_mark() {
        let filter = GlobFilter::new("diagram-?.puml").unwrap();
        assert!(filter.matches(&PathBuf::from("diagram-1.puml")));
        assert!(!filter.matches(&PathBuf::from("diagram-12.puml")));
    }

    #[test]
    fn test_literal_dots_not_wildcards() {
        let filter = GlobFilter::new("*.puml").unwrap();
        assert!(!filter.matches(&PathBuf::from("flowXpuml")));
    }

    #[test]
    fn test_match_all() {
        let filter = GlobFilter::any();
        assert!(filter.matches(&PathBuf::from("/anything/at.all")));
    }
}
