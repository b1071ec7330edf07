use std::fmt::{Display, Formatter};

use crate::{db::Dialect, error::DbError};

/// A table identifier that is safe to splice into SQL text.
///
/// Drivers cannot bind identifiers as parameters, so instead every name is checked against an
/// allow-list on construction: 1 to 64 ASCII letters, digits or underscores, not starting with a
/// digit. The name is then always quoted for the target [`Dialect`].
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TableName(String);

impl TableName {
    pub const MAX_LEN: usize = 64;

    pub fn new(name: impl Into<String>) -> Result<Self, DbError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= Self::MAX_LEN
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if valid {
            Ok(Self(name))
        } else {
            Err(DbError::InvalidIdentifier(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::MySql => format!("`{}`", self.0),
            Dialect::Sqlite => format!("\"{}\"", self.0),
        }
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The ordered, uniformly shaped tables a benchmark works on: `<prefix>_1 ..= <prefix>_N`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TableSet {
    prefix: String,
    tables: Vec<TableName>,
}

impl TableSet {
    pub fn new(prefix: &str, count: usize) -> Result<Self, DbError> {
        // Validate the prefix on its own so that an empty set still rejects a bad one
        TableName::new(prefix)?;
        let tables = (1..=count)
            .map(|n| TableName::new(format!("{prefix}_{n}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            prefix: prefix.to_owned(),
            tables,
        })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableName> {
        self.tables.iter()
    }

    /// Whether `name` follows this set's naming pattern (`<prefix>_<digits>`), whether or not it
    /// is one of the tables currently in the set.
    pub fn matches_pattern(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl<'a> IntoIterator for &'a TableSet {
    type Item = &'a TableName;
    type IntoIter = std::slice::Iter<'a, TableName>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["t", "table_1", "Users_30", "_x", "a".repeat(64).as_str()] {
            assert!(TableName::new(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for name in ["", "1table", "users; DROP TABLE x", "a`b", "a\"b", "tab le", "é", "a".repeat(65).as_str()] {
            let e = TableName::new(name).unwrap_err();
            assert!(matches!(e, DbError::InvalidIdentifier(n) if n == name));
        }
    }

    #[test]
    fn quoting() {
        let t = TableName::new("table_7").unwrap();
        assert_eq!(t.quoted(Dialect::MySql), "`table_7`");
        assert_eq!(t.quoted(Dialect::Sqlite), "\"table_7\"");
    }

    #[test]
    fn set_is_numbered_from_one() {
        let set = TableSet::new("table", 3).unwrap();
        let names = set.iter().map(TableName::as_str).collect::<Vec<_>>();
        assert_eq!(names, ["table_1", "table_2", "table_3"]);
        assert!(TableSet::new("table", 0).unwrap().is_empty());
        assert!(TableSet::new("bad prefix", 0).is_err());
    }

    #[test]
    fn pattern() {
        let set = TableSet::new("users", 2).unwrap();
        assert!(set.matches_pattern("users_1"));
        assert!(set.matches_pattern("users_99"));
        assert!(!set.matches_pattern("users_"));
        assert!(!set.matches_pattern("users_1a"));
        assert!(!set.matches_pattern("users"));
        assert!(!set.matches_pattern("other_1"));
        assert!(!set.matches_pattern("usersx_1"));
    }
}
