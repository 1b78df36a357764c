use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::mapping::{CookieRules, Mappings, SubstitutionMap, TableMap};

pub const DEFAULT_CONFIG: &str = "~/.flozer.json";
pub const DEFAULT_PROTOCOL: &str = "OpenFlow13";

/// Contents of the JSON config file. Every key is optional.
///
/// ```json
/// {
///   "cookie_map": {"0x0": "default", "0x100-0x1ff": "neutron", "*": "other"},
///   "table_map": {"0": "ingress", "5": "egress"},
///   "match_map": {"reg6": "tenant"},
///   "action_map": {"resubmit(,": "goto_table"},
///   "json": "no",
///   "disable_unicode": "yes",
///   "protocol": "OpenFlow13"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cookie_map: Option<CookieRules>,
    pub table_map: TableMap,
    pub match_map: SubstitutionMap,
    pub action_map: SubstitutionMap,
    #[serde(deserialize_with = "loose_bool")]
    pub json: Option<bool>,
    #[serde(deserialize_with = "loose_bool")]
    pub disable_unicode: Option<bool>,
    pub protocol: Option<String>,
}

impl Config {
    /// Loads the config file. A file that can't be read counts as empty.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    debug!("config file {} not found", path.display());
                } else {
                    warn!("couldn't read config file {}: {}", path.display(), e);
                }
                return Ok(Self::default());
            }
        };
        Self::from_json(&content)
            .map_err(|e| Error::with_kind(ErrorKind::Config, &format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::from(("malformed config", e)).set_kind(ErrorKind::Config))
    }

    pub fn mappings(&self) -> Mappings {
        let mut maps = Mappings::new()
            .with_table_map(self.table_map.clone())
            .with_match_map(self.match_map.clone())
            .with_action_map(self.action_map.clone());
        if let Some(rules) = &self.cookie_map {
            maps = maps.with_cookie_map(rules.clone());
        }
        maps
    }
}

/// Effective settings after merging the command line over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub disable_unicode: bool,
    pub json: bool,
    pub protocol: String,
    pub sort: bool,
    pub skip_malformed: bool,
}

/// Expands a leading `~` using `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME");
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            PathBuf::from(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

// Accepts true/"true"/"True"/"yes"/"Yes"/"1"/1, anything else is false.
fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<bool>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let truthy = match &value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64() == Some(1),
        Value::String(s) => matches!(s.as_str(), "true" | "True" | "yes" | "Yes" | "1"),
        _ => false,
    };
    Ok(Some(truthy))
}
