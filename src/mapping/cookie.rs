use std::convert::TryFrom;

use indexmap::IndexMap;
use serde::Deserialize;

use super::parser::parse_cookie_matcher;
use super::CookieMap;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieMatcher {
    Any,
    Exact(u64),
    /// Inclusive on both ends.
    Range(u64, u64),
    /// (value, mask); value is stored pre-masked.
    Masked(u64, u64),
}

impl CookieMatcher {
    pub fn matches(&self, cookie: u64) -> bool {
        match *self {
            CookieMatcher::Any => true,
            CookieMatcher::Exact(n) => cookie == n,
            CookieMatcher::Range(lo, hi) => lo <= cookie && cookie <= hi,
            CookieMatcher::Masked(value, mask) => cookie & mask == value,
        }
    }
}

/// Declarative cookie map. Rules are tried in declaration order and the
/// first matching one provides the label.
///
/// In a config file this is a JSON object, e.g.
///
/// ```json
/// {"0x0": "default", "0x100-0x1ff": "neutron", "0xab00/0xff00": "nova", "*": "other"}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct CookieRules {
    rules: Vec<(CookieMatcher, String)>,
}

impl CookieRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, matcher: CookieMatcher, label: &str) -> Self {
        self.rules.push((matcher, label.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TryFrom<IndexMap<String, String>> for CookieRules {
    type Error = Error;

    fn try_from(raw: IndexMap<String, String>) -> Result<Self> {
        let mut rules = Vec::with_capacity(raw.len());
        for (key, label) in raw {
            rules.push((parse_cookie_matcher(&key)?, label));
        }
        Ok(Self { rules })
    }
}

impl CookieMap for CookieRules {
    fn label(&self, cookie: u64) -> Result<String> {
        self.rules
            .iter()
            .find(|(matcher, _)| matcher.matches(cookie))
            .map(|(_, label)| label.clone())
            .ok_or_else(|| Error::cookie_map(cookie, "no matching cookie rule"))
    }
}
