use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::collection::FieldCollection;
use super::field::Field;
use crate::error::{Error, ErrorKind, Result};
use crate::mapping::Mappings;

const ACTIONS_SEP: &str = "actions=";
const PRIORITY: &str = "priority";

/// OpenFlow's OFP_DEFAULT_PRIORITY.
pub const DEFAULT_PRIORITY: u32 = 0x8000;

/// Label of a flow when no cookie map is configured.
pub const DEFAULT_LABEL: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(u64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.into())
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Scalar::Int(n)
    }
}

/// Decoration used by the human readable rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyphs {
    Unicode,
    Ascii,
}

impl Glyphs {
    pub fn new(disable_unicode: bool) -> Self {
        if disable_unicode {
            Glyphs::Ascii
        } else {
            Glyphs::Unicode
        }
    }

    fn arrow(&self) -> &'static str {
        match self {
            Glyphs::Unicode => "⤷",
            Glyphs::Ascii => "->",
        }
    }

    fn pipe(&self) -> &'static str {
        match self {
            Glyphs::Unicode => "│",
            Glyphs::Ascii => "|",
        }
    }
}

impl Default for Glyphs {
    fn default() -> Self {
        Glyphs::Unicode
    }
}

/// One parsed line of `ovs-ofctl dump-flows` output.
///
/// ```text
/// cookie=0x0, duration=1.1s, table=0, n_packets=5, n_bytes=200, priority=100,ip actions=resubmit(,1)
/// '----------------------- scalar fields ----------------------------------' '-matches-' '-actions---'
/// ```
///
/// The priority is moved out of the matches into the scalar fields.
#[derive(Debug)]
pub struct FlowRecord<'m> {
    raw: String,
    fields: IndexMap<String, Scalar>,
    raw_table: Option<u32>,
    priority: u32,
    label: String,
    matches: FieldCollection<'m>,
    actions: FieldCollection<'m>,
    glyphs: Glyphs,
}

impl<'m> FlowRecord<'m> {
    pub fn parse(line: &str, maps: &'m Mappings) -> Result<Self> {
        Self::new(line, maps, Glyphs::default())
    }

    pub fn new(line: &str, maps: &'m Mappings, glyphs: Glyphs) -> Result<Self> {
        let raw = line.trim();
        Self::parse_raw(raw, maps, glyphs).map_err(|e| e.at_line(raw))
    }

    fn parse_raw(raw: &str, maps: &'m Mappings, glyphs: Glyphs) -> Result<Self> {
        let mut tokens: Vec<&str> = raw.split(", ").collect();
        let match_action = tokens.pop().unwrap_or("");
        let (match_string, action_string) = split_actions(match_action)?;

        let (priority_token, match_string) = extract_priority(match_string);
        tokens.push(&priority_token);

        let mut fields = IndexMap::new();
        for token in tokens {
            let mut kv = token.split('=');
            match (kv.next(), kv.next(), kv.next()) {
                (Some(k), Some(v), None) => fields.insert(k.to_string(), Scalar::from(v)),
                _ => {
                    return Err(Error::malformed(&format!(
                        "expected key=value field, found '{}'",
                        token
                    )))
                }
            };
        }

        let raw_table = match fields.get("table") {
            Some(table) => Some(parse_int::<u32>(table, "table")?),
            None => None,
        };
        if let Some(table) = raw_table {
            let mapped = match maps.table_map() {
                Some(table_map) => match table_map.get(&table) {
                    Some(name) => Scalar::Text(name.clone()),
                    None => return Err(Error::unmapped_table(table)),
                },
                None => Scalar::Int(table as u64),
            };
            fields.insert("table".into(), mapped);
        }

        let priority = match fields.get(PRIORITY) {
            Some(priority) => parse_int::<u32>(priority, PRIORITY)?,
            None => DEFAULT_PRIORITY,
        };
        fields.insert(PRIORITY.into(), Scalar::Int(priority as u64));

        let label = match (maps.cookie_map(), fields.get("cookie")) {
            (Some(cookie_map), Some(cookie)) => {
                let cookie = parse_cookie(cookie)?;
                cookie_map.label(cookie).map_err(|e| match e.kind() {
                    ErrorKind::CookieMap => e,
                    _ => Error::cookie_map(cookie, &e.to_string()),
                })?
            }
            _ => DEFAULT_LABEL.into(),
        };

        let matches = FieldCollection::new(
            &match_string,
            match_string
                .split(',')
                .filter(|t| !t.is_empty())
                .map(|t| Field::new_match(t, maps))
                .collect(),
        );
        let actions = FieldCollection::new(
            action_string,
            split_action_tokens(action_string)
                .iter()
                .map(|t| Field::new_action(t, maps))
                .collect(),
        );

        // Mapping errors belong to the line, not to whoever renders it later.
        matches.mapped_string()?;
        actions.mapped_string()?;

        Ok(Self {
            raw: raw.into(),
            fields,
            raw_table,
            priority,
            label,
            matches,
            actions,
            glyphs,
        })
    }

    #[inline]
    pub fn raw_string(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn fields(&self) -> &IndexMap<String, Scalar> {
        &self.fields
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&Scalar> {
        self.fields.get(name)
    }

    /// The table id as it appeared in the dump, before table mapping.
    #[inline]
    pub fn raw_table(&self) -> Option<u32> {
        self.raw_table
    }

    #[inline]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn matches(&self) -> &FieldCollection<'m> {
        &self.matches
    }

    #[inline]
    pub fn actions(&self) -> &FieldCollection<'m> {
        &self.actions
    }

    #[inline]
    pub fn glyphs(&self) -> Glyphs {
        self.glyphs
    }

    /// Orders flows by priority only; equal priorities are not ordered.
    #[inline]
    pub fn priority_lt(&self, other: &FlowRecord) -> bool {
        self.priority < other.priority
    }

    fn display_field(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into())
    }
}

/// Splits `<matches> actions=<actions>`. The separator is also accepted
/// right after a comma.
fn split_actions(s: &str) -> Result<(&str, &str)> {
    let seps: Vec<usize> = s
        .match_indices(ACTIONS_SEP)
        .map(|(pos, _)| pos)
        .filter(|&pos| pos > 0 && matches!(s.as_bytes()[pos - 1], b' ' | b','))
        .collect();

    match seps.as_slice() {
        [pos] => Ok((&s[..pos - 1], &s[pos + ACTIONS_SEP.len()..])),
        [] => Err(Error::malformed("no ' actions=' separator found")),
        _ => Err(Error::malformed("more than one ' actions=' separator found")),
    }
}

/// Returns `(priority token, matches without priority)`.
fn extract_priority(match_string: &str) -> (String, String) {
    let start = match match_string.find(PRIORITY) {
        Some(start) => start,
        None => {
            return (
                format!("{}={}", PRIORITY, DEFAULT_PRIORITY),
                match_string.into(),
            )
        }
    };

    let rest = &match_string[start..];
    let priority = match rest.find(',') {
        Some(end) => &rest[..end],
        None => rest,
    };
    let remaining = match_string
        .split(',')
        .filter(|t| !t.contains(PRIORITY))
        .collect::<Vec<_>>()
        .join(",");

    (priority.into(), remaining)
}

/// Splits actions on commas, gluing `resubmit(,N)` back together.
fn split_action_tokens(action_string: &str) -> Vec<String> {
    let mut tokens = action_string.split(',');
    let mut actions = Vec::new();

    while let Some(token) = tokens.next() {
        let action = if token.contains("resubmit") {
            match tokens.next() {
                Some(next) => format!("{},{}", token, next),
                None => token.to_string(),
            }
        } else {
            token.to_string()
        };

        if !action.is_empty() {
            actions.push(action);
        }
    }
    actions
}

fn parse_int<T: std::str::FromStr>(value: &Scalar, name: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = value.to_string();
    value.parse::<T>().map_err(|e| {
        Error::from((format!("{} is not an integer: '{}'", name, value), e))
            .set_kind(ErrorKind::MalformedFlow)
    })
}

fn parse_cookie(value: &Scalar) -> Result<u64> {
    let cookie = value.to_string();
    let hex = cookie
        .strip_prefix("0x")
        .or_else(|| cookie.strip_prefix("0X"))
        .unwrap_or(&cookie);
    u64::from_str_radix(hex, 16).map_err(|e| {
        Error::from((format!("cookie is not a hex integer: '{}'", cookie), e))
            .set_kind(ErrorKind::MalformedFlow)
    })
}

impl<'m> fmt::Display for FlowRecord<'m> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} cookie={} table={} priority={} n_packets={}",
            self.label,
            self.display_field("cookie"),
            self.display_field("table"),
            self.priority,
            self.display_field("n_packets"),
        )?;
        writeln!(
            f,
            " {} matches {} {}",
            self.glyphs.arrow(),
            self.glyphs.pipe(),
            self.matches
        )?;
        writeln!(
            f,
            " {} actions {} {}",
            self.glyphs.arrow(),
            self.glyphs.pipe(),
            self.actions
        )
    }
}

impl<'m> Serialize for FlowRecord<'m> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FlowRecord", 4)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("fields", &self.fields)?;
        state.serialize_field("matches", &self.matches)?;
        state.serialize_field("actions", &self.actions)?;
        state.end()
    }
}
