use std::fmt;

use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};

use super::field::Field;
use crate::error::Result;

/// Ordered matches or actions of a single flow.
#[derive(Debug)]
pub struct FieldCollection<'m> {
    raw: String,
    fields: Vec<Field<'m>>,
    mapped: OnceCell<String>,
}

impl<'m> FieldCollection<'m> {
    pub fn new(raw: &str, fields: Vec<Field<'m>>) -> Self {
        Self {
            raw: raw.into(),
            fields,
            mapped: OnceCell::new(),
        }
    }

    /// The source text the fields were parsed from.
    #[inline]
    pub fn raw_string(&self) -> &str {
        &self.raw
    }

    pub fn mapped_string(&self) -> Result<&str> {
        self.mapped
            .get_or_try_init(|| {
                let parts = self
                    .fields
                    .iter()
                    .map(Field::mapped_string)
                    .collect::<Result<Vec<_>>>()?;
                Ok(parts.join(","))
            })
            .map(String::as_str)
    }

    /// Whether `s` occurs in the raw or the mapped joined string. Fails
    /// when the fields can't be mapped.
    pub fn contains(&self, s: &str) -> Result<bool> {
        if self.raw.contains(s) {
            return Ok(true);
        }
        Ok(self.mapped_string()?.contains(s))
    }

    /// All the fields named `name`, before or after mapping.
    pub fn find(&self, name: &str) -> Vec<&Field<'m>> {
        self.fields
            .iter()
            .filter(|f| f.name() == name || f.mapped_name().map(|n| n == name).unwrap_or(false))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field<'m>> {
        self.fields.iter()
    }
}

impl<'a, 'm> IntoIterator for &'a FieldCollection<'m> {
    type Item = &'a Field<'m>;
    type IntoIter = std::slice::Iter<'a, Field<'m>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<'m> fmt::Display for FieldCollection<'m> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

impl<'m> Serialize for FieldCollection<'m> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::mapping::Mappings;

    fn matches<'m>(raw: &str, maps: &'m Mappings) -> FieldCollection<'m> {
        let fields = raw
            .split(',')
            .filter(|t| !t.is_empty())
            .map(|t| Field::new_match(t, maps))
            .collect();
        FieldCollection::new(raw, fields)
    }

    #[test]
    fn test_find_returns_every_duplicate() {
        let maps = Mappings::new();
        let coll = matches("ip,reg0=0x1,nw_dst=10.0.0.1,reg0=0x2", &maps);

        let found = coll.find("reg0");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value(), Some("0x1"));
        assert_eq!(found[1].value(), Some("0x2"));

        assert_eq!(coll.find("ip").len(), 1);
        assert!(coll.find("tcp").is_empty());
    }

    #[test]
    fn test_find_by_mapped_name() {
        let maps = Mappings::new().with_match_map(
            vec![("reg6".to_string(), "tenant".to_string())]
                .into_iter()
                .collect(),
        );
        let coll = matches("ip,reg6=0x42", &maps);

        assert_eq!(coll.find("tenant").len(), 1);
        assert_eq!(coll.find("reg6").len(), 1);
    }

    #[test]
    fn test_contains_raw_or_mapped() -> std::result::Result<(), Error> {
        let maps = Mappings::new().with_match_map(
            vec![("reg6".to_string(), "tenant".to_string())]
                .into_iter()
                .collect(),
        );
        let coll = matches("ip,reg6=0x42", &maps);

        assert!(coll.contains("reg6=0x42")?);
        assert!(coll.contains("tenant=0x42")?);
        assert!(!coll.contains("tcp")?);
        Ok(())
    }

    #[test]
    fn test_contains_reports_mapping_error() {
        let maps = Mappings::new().with_table_map(vec![(0, "ingress".to_string())].into_iter().collect());
        let fields = vec![
            Field::new_action("output:1", &maps),
            Field::new_action("goto_table:7", &maps),
        ];
        let coll = FieldCollection::new("output:1,goto_table:7", fields);

        match coll.contains("output:1") {
            Ok(found) => assert!(found),
            Err(e) => panic!("unexpected error {}", e),
        }
        match coll.contains("ingress") {
            Err(e) => assert_eq!(e.kind(), ErrorKind::UnmappedTable),
            Ok(found) => panic!("expected error but got {}", found),
        }
    }

    #[test]
    fn test_joined_strings() -> std::result::Result<(), Error> {
        let maps = Mappings::new();
        let coll = matches("ip,,nw_src=10.0.0.1", &maps);

        assert_eq!(coll.len(), 2);
        assert_eq!(coll.raw_string(), "ip,,nw_src=10.0.0.1");
        assert_eq!(coll.mapped_string()?, "ip,nw_src=10.0.0.1");
        assert_eq!(coll.to_string(), "ip(), nw_src(10.0.0.1)");
        Ok(())
    }
}
