use std::fmt;

use once_cell::sync::OnceCell;
use serde::ser::{Error as SerError, Serialize, SerializeMap, Serializer};

use crate::error::{Error, ErrorKind, Result};
use crate::mapping::{Mappings, SubstitutionMap};

const RESUBMIT: &str = "resubmit(,";
const GOTO_TABLE: &str = "goto_table";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `key` or `key=value` predicate.
    Match,
    /// `key` or `key:value` action step.
    Action,
}

impl FieldKind {
    #[inline]
    pub fn separator(&self) -> char {
        match self {
            FieldKind::Match => '=',
            FieldKind::Action => ':',
        }
    }
}

/// A single match predicate or action of a flow.
///
/// The raw token is kept as is. The mapped form is computed on first use
/// and cached, so later calls return the very same string.
#[derive(Debug)]
pub struct Field<'m> {
    kind: FieldKind,
    raw: String,
    name_len: usize,
    maps: &'m Mappings,
    mapped: OnceCell<String>,
}

impl<'m> Field<'m> {
    pub fn new(token: &str, kind: FieldKind, maps: &'m Mappings) -> Self {
        let name_len = token.find(kind.separator()).unwrap_or_else(|| token.len());
        Self {
            kind,
            raw: token.into(),
            name_len,
            maps,
            mapped: OnceCell::new(),
        }
    }

    pub fn new_match(token: &str, maps: &'m Mappings) -> Self {
        Self::new(token, FieldKind::Match, maps)
    }

    pub fn new_action(token: &str, maps: &'m Mappings) -> Self {
        Self::new(token, FieldKind::Action, maps)
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub fn raw_string(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.raw[..self.name_len]
    }

    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.raw.get(self.name_len + 1..)
    }

    pub fn mapped_string(&self) -> Result<&str> {
        self.mapped
            .get_or_try_init(|| match self.kind {
                FieldKind::Match => Ok(self.map_match()),
                FieldKind::Action => self.map_action(),
            })
            .map(String::as_str)
    }

    pub fn mapped_name(&self) -> Result<&str> {
        let ms = self.mapped_string()?;
        Ok(ms.split(self.kind.separator()).next().unwrap_or(ms))
    }

    pub fn mapped_value(&self) -> Result<Option<&str>> {
        let ms = self.mapped_string()?;
        Ok(ms
            .find(self.kind.separator())
            .map(|pos| &ms[pos + self.kind.separator().len_utf8()..]))
    }

    fn map_match(&self) -> String {
        substitute(&self.raw, self.maps.match_map())
    }

    fn map_action(&self) -> Result<String> {
        let sep = self.kind.separator();
        let action_map = self.maps.action_map();

        let mut ms = self.raw.clone();
        if let Some(verb) = action_map.get(RESUBMIT) {
            if ms.contains(RESUBMIT) {
                // resubmit(,N) -> <verb>:N
                let end = ms.len().saturating_sub(1);
                let table = ms.get(RESUBMIT.len()..end).unwrap_or("");
                ms = format!("{}{}{}", verb, sep, table);
            }
        }
        let ms = substitute(&ms, action_map);

        let table_map = match self.maps.table_map() {
            Some(table_map) if ms.contains(GOTO_TABLE) => table_map,
            _ => return Ok(ms),
        };

        let table = ms
            .split(sep)
            .nth(1)
            .ok_or_else(|| Error::malformed(&format!("no table id in action '{}'", ms)))?;
        let table = table.trim().parse::<u32>().map_err(|e| {
            Error::from((format!("bad table id in action '{}'", ms), e))
                .set_kind(ErrorKind::MalformedFlow)
        })?;

        match table_map.get(&table) {
            Some(name) => Ok(format!("{}{}{}", GOTO_TABLE, sep, name)),
            None => Err(Error::unmapped_table(table)),
        }
    }
}

fn substitute(s: &str, substitutions: &SubstitutionMap) -> String {
    substitutions
        .iter()
        .filter(|(pattern, _)| !pattern.is_empty())
        .fold(s.to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern.as_str(), replacement)
        })
}

// Falls back to the raw name and value if the field can't be mapped.
impl<'m> fmt::Display for Field<'m> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (name, value) = match (self.mapped_name(), self.mapped_value()) {
            (Ok(name), Ok(value)) => (name, value),
            _ => (self.name(), self.value()),
        };
        write!(f, "{}({})", name, value.unwrap_or(""))
    }
}

impl<'m> Serialize for Field<'m> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let name = self.mapped_name().map_err(S::Error::custom)?;
        let value = self.mapped_value().map_err(S::Error::custom)?;

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(name, &value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::TableMap;

    fn substitutions(pairs: &[(&str, &str)]) -> SubstitutionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn tables(pairs: &[(u32, &str)]) -> TableMap {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_field_split() {
        let maps = Mappings::new();

        #[rustfmt::skip]
        let tests = [
            (Field::new_match("ip", &maps), "ip", None),
            (Field::new_match("nw_src=10.0.0.1", &maps), "nw_src", Some("10.0.0.1")),
            (Field::new_match("reg0=0x1/0xff", &maps), "reg0", Some("0x1/0xff")),
            (Field::new_match("in_port=", &maps), "in_port", Some("")),
            (Field::new_action("drop", &maps), "drop", None),
            (Field::new_action("output:2", &maps), "output", Some("2")),
            (Field::new_action("set_field:00:11->eth_src", &maps), "set_field", Some("00:11->eth_src")),
            (Field::new_action("mod_dl_src=00:11", &maps), "mod_dl_src=00", Some("11")),
        ];

        for (field, name, value) in &tests {
            assert_eq!(field.name(), *name);
            assert_eq!(field.value(), *value);
        }
    }

    #[test]
    fn test_unmapped_fields_are_identity() -> std::result::Result<(), Error> {
        let maps = Mappings::new();
        for token in &["ip", "nw_dst=10.0.0.0/8", "resubmit(,5)", "goto_table:3"] {
            let m = Field::new_match(token, &maps);
            let a = Field::new_action(token, &maps);
            assert_eq!(m.mapped_string()?, *token);
            assert_eq!(a.mapped_string()?, *token);
        }
        Ok(())
    }

    #[test]
    fn test_match_substitution_in_declaration_order() -> std::result::Result<(), Error> {
        let maps = Mappings::new().with_match_map(substitutions(&[
            ("reg0", "zone"),
            ("zone=0x1", "zone=blue"),
        ]));

        let field = Field::new_match("reg0=0x1", &maps);
        assert_eq!(field.mapped_string()?, "zone=blue");
        assert_eq!(field.mapped_name()?, "zone");
        assert_eq!(field.mapped_value()?, Some("blue"));
        assert_eq!(field.name(), "reg0");
        Ok(())
    }

    #[test]
    fn test_action_resubmit_rewrite() -> std::result::Result<(), Error> {
        let maps = Mappings::new().with_action_map(substitutions(&[("resubmit(,", "goto_table")]));
        let field = Field::new_action("resubmit(,5)", &maps);
        assert_eq!(field.mapped_string()?, "goto_table:5");
        assert_eq!(field.to_string(), "goto_table(5)");

        let maps = Mappings::new()
            .with_action_map(substitutions(&[("resubmit(,", "goto_table")]))
            .with_table_map(tables(&[(0, "ingress"), (5, "egress")]));
        let field = Field::new_action("resubmit(,5)", &maps);
        assert_eq!(field.mapped_string()?, "goto_table:egress");
        assert_eq!(field.name(), "resubmit(,5)");
        assert_eq!(field.mapped_name()?, "goto_table");
        Ok(())
    }

    #[test]
    fn test_action_substitutions_after_resubmit_rewrite() -> std::result::Result<(), Error> {
        let chained = substitutions(&[("resubmit(,", "goto_table"), ("goto_table", "jump")]);

        #[rustfmt::skip]
        let tests = [
            (Mappings::new().with_action_map(chained.clone()), "resubmit(,5)", "jump:5"),
            (Mappings::new().with_action_map(chained.clone()), "output:1", "output:1"),
            (
                Mappings::new()
                    .with_action_map(chained.clone())
                    .with_table_map(tables(&[(5, "egress")])),
                "resubmit(,5)",
                "jump:5",
            ),
            (
                Mappings::new()
                    .with_action_map(substitutions(&[("resubmit(,", "goto_table"), ("egress", "out")]))
                    .with_table_map(tables(&[(5, "egress")])),
                "resubmit(,5)",
                "goto_table:egress",
            ),
            (
                Mappings::new()
                    .with_action_map(substitutions(&[("resubmit(,", "goto_table"), (":5", ":6")]))
                    .with_table_map(tables(&[(5, "egress"), (6, "acl")])),
                "resubmit(,5)",
                "goto_table:acl",
            ),
        ];

        for (maps, token, expected) in &tests {
            let field = Field::new_action(token, maps);
            assert_eq!(field.mapped_string()?, *expected, "while mapping {}", token);
        }
        Ok(())
    }

    #[test]
    fn test_action_goto_table_without_action_map() -> std::result::Result<(), Error> {
        let maps = Mappings::new().with_table_map(tables(&[(3, "acl")]));
        let field = Field::new_action("goto_table:3", &maps);
        assert_eq!(field.mapped_string()?, "goto_table:acl");
        Ok(())
    }

    #[test]
    fn test_action_unmapped_table() {
        let maps = Mappings::new().with_table_map(tables(&[(0, "ingress")]));
        let field = Field::new_action("goto_table:7", &maps);
        match field.mapped_string() {
            Err(e) => assert_eq!(e.kind(), ErrorKind::UnmappedTable),
            Ok(ms) => panic!("expected error but got {}", ms),
        }
    }

    #[test]
    fn test_display_unmapped_table_shows_raw() {
        let maps = Mappings::new().with_table_map(tables(&[(0, "ingress")]));
        let field = Field::new_action("goto_table:7", &maps);
        assert_eq!(field.to_string(), "goto_table(7)");
        assert!(field.mapped_string().is_err());

        let maps = Mappings::new()
            .with_action_map(substitutions(&[("resubmit(,", "goto_table")]))
            .with_table_map(tables(&[(0, "ingress")]));
        let field = Field::new_action("resubmit(,9)", &maps);
        assert_eq!(field.to_string(), "resubmit(,9)()");
    }

    #[test]
    fn test_mapped_string_is_cached() -> std::result::Result<(), Error> {
        let maps = Mappings::new().with_action_map(substitutions(&[("output", "out")]));
        let field = Field::new_action("output:1", &maps);
        let first = field.mapped_string()?;
        let second = field.mapped_string()?;
        assert!(std::ptr::eq(first, second));
        Ok(())
    }

    #[test]
    fn test_field_display() {
        let maps = Mappings::new();
        assert_eq!(Field::new_match("ip", &maps).to_string(), "ip()");
        assert_eq!(Field::new_match("tp_dst=80", &maps).to_string(), "tp_dst(80)");
        assert_eq!(Field::new_action("output:LOCAL", &maps).to_string(), "output(LOCAL)");
    }

    #[test]
    fn test_field_serialize() -> std::result::Result<(), serde_json::Error> {
        let maps = Mappings::new();
        assert_eq!(
            serde_json::to_string(&Field::new_match("tcp", &maps))?,
            r#"{"tcp":null}"#
        );
        assert_eq!(
            serde_json::to_string(&Field::new_action("output:2", &maps))?,
            r#"{"output":"2"}"#
        );
        Ok(())
    }
}
