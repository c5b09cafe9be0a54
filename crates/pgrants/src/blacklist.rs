//! Role exclusion patterns.

use crate::{Error, Result};
use regex::Regex;

/// Ordered glob patterns matched against role names.
///
/// `*` matches any run of characters, `?` exactly one. Patterns are anchored
/// and case-sensitive, like role names.
#[derive(Debug, Clone, Default)]
pub struct RolesBlacklist {
    patterns: Vec<(String, Regex)>,
}

impl RolesBlacklist {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.into();
                let regex = Regex::new(&glob_to_regex(&pattern)).map_err(|source| {
                    Error::Pattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                Ok((pattern, regex))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// The first pattern matching `role`.
    pub fn match_str(&self, role: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(role))
            .map(|(pattern, _)| pattern.as_str())
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(pattern, _)| pattern.as_str())
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut re = String::with_capacity(glob.len() + 8);
    // Role names may contain newlines.
    re.push_str("(?s)^");
    let mut literal = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    re.push('$');
    re
}
