//! Statement kinds and leading-keyword classification.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, RouterError};
use crate::sql::strip::strip_comments;

static SELECT_FOR_UPDATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^select\s+.*\s+for\s+update.*$").unwrap()
});

/// Kind of a routed statement, decided by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    SelectForUpdate,
    Show,
    Load,
    Insert,
    Update,
    Delete,
    Replace,
    Truncate,
    Create,
    Drop,
    Alter,
}

/// Keywords in match order. `select` is refined after matching.
const KEYWORDS: &[(&str, StatementKind)] = &[
    ("select", StatementKind::Select),
    ("show", StatementKind::Show),
    ("insert", StatementKind::Insert),
    ("update", StatementKind::Update),
    ("delete", StatementKind::Delete),
    ("replace", StatementKind::Replace),
    ("truncate", StatementKind::Truncate),
    ("create", StatementKind::Create),
    ("drop", StatementKind::Drop),
    ("load", StatementKind::Load),
    ("alter", StatementKind::Alter),
];

impl StatementKind {
    /// True only for kinds that may run on the read backend.
    ///
    /// `SELECT ... FOR UPDATE` is write-class so the lock is taken where
    /// the following writes will run.
    pub fn is_read(self) -> bool {
        matches!(
            self,
            StatementKind::Select | StatementKind::Show | StatementKind::Load
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::SelectForUpdate => "select_for_update",
            StatementKind::Show => "show",
            StatementKind::Load => "load",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Replace => "replace",
            StatementKind::Truncate => "truncate",
            StatementKind::Create => "create",
            StatementKind::Drop => "drop",
            StatementKind::Alter => "alter",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify raw SQL text.
///
/// Comments and literal contents are stripped first, so keyword-like text
/// inside them never decides the kind.
pub fn classify(sql: &str) -> Result<StatementKind> {
    let stripped = strip_comments(sql);
    let text = stripped.trim();

    let kind = KEYWORDS
        .iter()
        .find(|(keyword, _)| starts_with_ignore_case(text, keyword))
        .map(|(_, kind)| *kind)
        .ok_or_else(|| RouterError::Classification {
            statement: leading_word(text).to_string(),
        })?;

    if kind == StatementKind::Select && SELECT_FOR_UPDATE_REGEX.is_match(text) {
        return Ok(StatementKind::SelectForUpdate);
    }
    Ok(kind)
}

fn starts_with_ignore_case(text: &str, keyword: &str) -> bool {
    text.get(..keyword.len())
        .map(|head| head.eq_ignore_ascii_case(keyword))
        .unwrap_or(false)
}

fn leading_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_keywords() {
        let cases = [
            ("SELECT * FROM t", StatementKind::Select),
            ("  show tables", StatementKind::Show),
            ("Insert into t values (1)", StatementKind::Insert),
            ("update t set x = 1", StatementKind::Update),
            ("DELETE FROM t", StatementKind::Delete),
            ("replace into t values (1)", StatementKind::Replace),
            ("truncate table t", StatementKind::Truncate),
            ("create table t (id int)", StatementKind::Create),
            ("drop table t", StatementKind::Drop),
            ("load data infile 'x' into table t", StatementKind::Load),
            ("alter table t add c int", StatementKind::Alter),
        ];
        for (sql, expected) in cases {
            assert_eq!(classify(sql).unwrap(), expected, "{}", sql);
        }
    }

    #[test]
    fn test_select_for_update() {
        assert_eq!(
            classify("select * from t for update").unwrap(),
            StatementKind::SelectForUpdate
        );
        assert_eq!(
            classify("SELECT id\nFROM t\nWHERE id = 1\nFOR   UPDATE NOWAIT").unwrap(),
            StatementKind::SelectForUpdate
        );
        assert_eq!(classify("select * from t").unwrap(), StatementKind::Select);
        assert!(!StatementKind::SelectForUpdate.is_read());
        assert!(StatementKind::Select.is_read());
    }

    #[test]
    fn test_for_update_inside_literal_is_ignored() {
        assert_eq!(
            classify("select 'x for update' from t").unwrap(),
            StatementKind::Select
        );
    }

    #[test]
    fn test_comments_hide_keywords() {
        assert_eq!(
            classify("/* select */ update t set x=1").unwrap(),
            StatementKind::Update
        );
        assert_eq!(
            classify("-- select\ndelete from t").unwrap(),
            StatementKind::Delete
        );
        assert_eq!(
            classify("# insert\nselect 1").unwrap(),
            StatementKind::Select
        );
    }

    #[test]
    fn test_read_kinds() {
        assert!(StatementKind::Show.is_read());
        assert!(StatementKind::Load.is_read());
        assert!(!StatementKind::Insert.is_read());
        assert!(!StatementKind::Alter.is_read());
    }

    #[test]
    fn test_unrecognized_statement() {
        match classify("merge into t using s on (1=1)") {
            Err(RouterError::Classification { statement }) => assert_eq!(statement, "merge"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(classify("").is_err());
        assert!(classify("/* only a comment */").is_err());
    }
}
