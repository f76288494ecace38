//! Filter expressions: `field:=value && field:>=value ...`.

use std::fmt;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }
}

/// One `field:<op>value` clause of a conjunctive filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl ToString) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.to_string(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl ToString) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let needs_quoting = self
            .value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '&' | ',' | ':'));
        if needs_quoting {
            write!(f, "{}:{}`{}`", self.field, self.op.as_str(), self.value)
        } else {
            write!(f, "{}:{}{}", self.field, self.op.as_str(), self.value)
        }
    }
}

/// Joins clauses with `&&`; `None` when there is nothing to filter on.
pub fn build_filter_expression(clauses: &[FilterClause]) -> Option<String> {
    if clauses.is_empty() {
        return None;
    }
    Some(
        clauses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" && "),
    )
}

pub fn parse_filter_expression(expr: &str) -> Result<Vec<FilterClause>, StoreError> {
    split_conjunction(expr)?
        .into_iter()
        .map(parse_clause)
        .collect()
}

/// Splits on `&&` outside backtick-quoted values.
fn split_conjunction(expr: &str) -> Result<Vec<&str>, StoreError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let bytes = expr.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'`' => quoted = !quoted,
            b'&' if !quoted && bytes.get(i + 1) == Some(&b'&') => {
                parts.push(&expr[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    if quoted {
        return Err(StoreError::InvalidQuery(
            "unterminated backtick in filter".to_string(),
        ));
    }
    parts.push(&expr[start..]);

    Ok(parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect())
}

fn parse_clause(clause: &str) -> Result<FilterClause, StoreError> {
    let invalid = || StoreError::InvalidQuery(format!("malformed filter clause '{}'", clause));

    let (field, rest) = clause.split_once(':').ok_or_else(invalid)?;
    let field = field.trim();
    if field.is_empty() {
        return Err(invalid());
    }

    // Two-character operators first so `>=` is not read as `>` followed by `=value`.
    let (op, value) = [
        ("!=", FilterOp::NotEq),
        (">=", FilterOp::Gte),
        ("<=", FilterOp::Lte),
        ("=", FilterOp::Eq),
        (">", FilterOp::Gt),
        ("<", FilterOp::Lt),
    ]
    .into_iter()
    .find_map(|(token, op)| rest.strip_prefix(token).map(|value| (op, value)))
    .unwrap_or((FilterOp::Eq, rest));

    let value = value.trim();
    let value = value
        .strip_prefix('`')
        .and_then(|v| v.strip_suffix('`'))
        .unwrap_or(value);
    if value.is_empty() {
        return Err(invalid());
    }

    Ok(FilterClause::new(field, op, value))
}
