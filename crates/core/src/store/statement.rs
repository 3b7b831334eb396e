//! Parameterized statements.
//!
//! Templates use the `%s` positional placeholder convention of the
//! Postgres drivers this crate targets. A literal percent sign is written
//! `%%`; a lone `%` followed by anything else is a template error.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What a statement does. Lets executors and audits reason about a
/// statement without parsing its SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    InsertEntry,
    UpdateTranscription,
    UpdateAssociation,
    RepairAssociation,
    LinkHomophonesSelf,
    LinkHomophonesPeers,
    SelectHomophoneCandidates,
    SelectEntry,
    SetAssociation,
    SelectEntryId,
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(kind: StatementKind, sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self { kind, sql: sql.into(), params }
    }

    /// Text parameter at `index`, if any.
    pub fn text_param(&self, index: usize) -> Option<&str> {
        self.params.get(index).and_then(SqlValue::as_text)
    }

    /// Check the template against its parameters.
    pub fn validate(&self) -> Result<()> {
        let placeholders = count_placeholders(&self.sql)?;
        if placeholders != self.params.len() {
            return Err(Error::Template(format!(
                "{:?}: {} placeholders but {} parameters",
                self.kind,
                placeholders,
                self.params.len()
            )));
        }
        Ok(())
    }
}

/// Count `%s` placeholders, rejecting undoubled literal percent signs.
pub fn count_placeholders(sql: &str) -> Result<usize> {
    let mut count = 0;
    let mut chars = sql.chars().enumerate();
    while let Some((pos, c)) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some((_, 's')) => count += 1,
            Some((_, '%')) => {}
            other => {
                return Err(Error::Template(format!(
                    "stray '%' at position {} (followed by {:?})",
                    pos,
                    other.map(|(_, c)| c)
                )))
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("SELECT 1").unwrap(), 0);
        assert_eq!(count_placeholders("WHERE a = %s AND b = %s").unwrap(), 2);
        assert_eq!(count_placeholders("WHERE w LIKE '%% %%' AND x = %s").unwrap(), 1);
    }

    #[test]
    fn test_lone_percent_is_rejected() {
        assert!(matches!(count_placeholders("LIKE '% %'"), Err(Error::Template(_))));
        assert!(matches!(count_placeholders("trailing %"), Err(Error::Template(_))));
        assert!(matches!(count_placeholders("%d"), Err(Error::Template(_))));
    }

    #[test]
    fn test_validate_counts_params() {
        let ok = Statement::new(
            StatementKind::SelectEntryId,
            "WHERE word = %s AND list_id = %s",
            vec!["ami".into(), 1i64.into()],
        );
        assert!(ok.validate().is_ok());
        let bad = Statement::new(StatementKind::SelectEntryId, "WHERE word = %s", vec![]);
        assert!(matches!(bad.validate(), Err(Error::Template(_))));
    }

    #[test]
    fn test_option_converts_to_null() {
        let none: Option<String> = None;
        assert_eq!(SqlValue::from(none), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".to_string()));
    }

    #[test]
    fn test_sql_value_serializes_untagged() {
        let params: Vec<SqlValue> = vec!["ami".into(), 3i64.into(), SqlValue::Null, true.into()];
        assert_eq!(serde_json::to_string(&params).unwrap(), "[\"ami\",3,null,true]");
    }
}
