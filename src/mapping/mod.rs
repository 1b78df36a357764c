//! Relabeling tables applied to parsed flows.
//!
//! All the tables are supplied once per batch and only ever read while
//! parsing, so a single `Mappings` can be shared by any number of flows
//! (and threads).

mod cookie;
mod parser;

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;

pub use cookie::{CookieMatcher, CookieRules};

use crate::error::Result;

/// Integer table id to table name.
pub type TableMap = BTreeMap<u32, String>;

/// Literal substring to replacement. Substitutions are applied in
/// declaration order.
pub type SubstitutionMap = IndexMap<String, String>;

/// Turns an integer cookie into a display label.
pub trait CookieMap: Send + Sync {
    fn label(&self, cookie: u64) -> Result<String>;
}

impl<F> CookieMap for F
where
    F: Fn(u64) -> Result<String> + Send + Sync,
{
    fn label(&self, cookie: u64) -> Result<String> {
        self(cookie)
    }
}

#[derive(Default)]
pub struct Mappings {
    cookie_map: Option<Box<dyn CookieMap>>,
    table_map: TableMap,
    match_map: SubstitutionMap,
    action_map: SubstitutionMap,
}

impl Mappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie_map<C: CookieMap + 'static>(mut self, cookie_map: C) -> Self {
        self.cookie_map = Some(Box::new(cookie_map));
        self
    }

    pub fn with_table_map(mut self, table_map: TableMap) -> Self {
        self.table_map = table_map;
        self
    }

    pub fn with_match_map(mut self, match_map: SubstitutionMap) -> Self {
        self.match_map = match_map;
        self
    }

    pub fn with_action_map(mut self, action_map: SubstitutionMap) -> Self {
        self.action_map = action_map;
        self
    }

    #[inline]
    pub fn cookie_map(&self) -> Option<&dyn CookieMap> {
        self.cookie_map.as_deref()
    }

    /// An empty table map counts as no table map at all.
    #[inline]
    pub fn table_map(&self) -> Option<&TableMap> {
        if self.table_map.is_empty() {
            None
        } else {
            Some(&self.table_map)
        }
    }

    #[inline]
    pub fn match_map(&self) -> &SubstitutionMap {
        &self.match_map
    }

    #[inline]
    pub fn action_map(&self) -> &SubstitutionMap {
        &self.action_map
    }
}

impl fmt::Debug for Mappings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Mappings")
            .field("cookie_map", &self.cookie_map.is_some())
            .field("table_map", &self.table_map)
            .field("match_map", &self.match_map)
            .field("action_map", &self.action_map)
            .finish()
    }
}
