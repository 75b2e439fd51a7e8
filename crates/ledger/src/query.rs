use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{LedgerError, Result};

/// A rich query over the documents stored in the ledger.
///
/// The format follows the Mango selector syntax used by document-oriented
/// world-state databases: a `selector` object plus optional `limit` / `skip`.
/// Callers hand queries to the ledger verbatim; only the backend interprets the
/// selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichQuery {
    /// Field conditions, all of which must hold.
    pub selector: Value,

    /// Maximum number of records to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Number of matching records to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
}

impl Default for RichQuery {
    fn default() -> Self {
        Self {
            selector: Value::Object(Map::new()),
            limit: None,
            skip: None,
        }
    }
}

impl RichQuery {
    /// Creates a query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query from a selector object.
    pub fn with_selector(selector: Value) -> Result<Self> {
        if !selector.is_object() {
            return Err(LedgerError::InvalidQuery(
                "selector must be a JSON object".to_string(),
            ));
        }
        Ok(Self {
            selector,
            ..Default::default()
        })
    }

    /// Parses a query string such as `{"selector":{"docType":"Order"}}`.
    pub fn parse(raw: &str) -> Result<Self> {
        let query: RichQuery = serde_json::from_str(raw)
            .map_err(|e| LedgerError::InvalidQuery(format!("malformed query: {e}")))?;
        if !query.selector.is_object() {
            return Err(LedgerError::InvalidQuery(
                "selector must be a JSON object".to_string(),
            ));
        }
        Ok(query)
    }

    /// Adds an equality condition on a top-level field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Object(ref mut map) = self.selector {
            map.insert(name.into(), value.into());
        }
        self
    }

    /// Limits the number of records returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many matching records.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Evaluates the selector against a document.
    pub fn matches(&self, document: &Value) -> Result<bool> {
        match &self.selector {
            Value::Object(conditions) => match_selector(conditions, document),
            _ => Err(LedgerError::InvalidQuery(
                "selector must be a JSON object".to_string(),
            )),
        }
    }

    /// Returns the selector as a containment document when it consists only of
    /// plain equality conditions.
    ///
    /// Backends that index documents with a containment operator (JSONB `@>`)
    /// can evaluate such selectors directly.
    pub fn as_containment(&self) -> Result<&Value> {
        fn check(value: &Value) -> Result<()> {
            match value {
                Value::Object(map) => {
                    for (key, nested) in map {
                        if key.starts_with('$') {
                            return Err(LedgerError::UnsupportedQuery(format!(
                                "operator {key} requires an in-memory evaluator"
                            )));
                        }
                        if key.contains('.') {
                            return Err(LedgerError::UnsupportedQuery(format!(
                                "dotted field path {key}"
                            )));
                        }
                        check(nested)?;
                    }
                    Ok(())
                }
                Value::Array(_) => Err(LedgerError::UnsupportedQuery(
                    "array equality".to_string(),
                )),
                _ => Ok(()),
            }
        }

        check(&self.selector)?;
        Ok(&self.selector)
    }

    /// Applies `skip` and `limit` to an already-filtered result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = self.skip.unwrap_or(0);
        let iter = items.into_iter().skip(skip);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

fn match_selector(conditions: &Map<String, Value>, document: &Value) -> Result<bool> {
    for (key, condition) in conditions {
        let matched = match key.as_str() {
            "$and" => {
                let clauses = sub_selectors(key, condition)?;
                let mut all = true;
                for clause in clauses {
                    if !match_selector(clause, document)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let clauses = sub_selectors(key, condition)?;
                let mut any = false;
                for clause in clauses {
                    if match_selector(clause, document)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            op if op.starts_with('$') => {
                return Err(LedgerError::UnsupportedQuery(format!(
                    "top-level operator {op}"
                )));
            }
            path => match_field(lookup(document, path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_selectors<'a>(op: &str, condition: &'a Value) -> Result<Vec<&'a Map<String, Value>>> {
    let clauses = condition
        .as_array()
        .ok_or_else(|| LedgerError::InvalidQuery(format!("{op} expects an array")))?;
    clauses
        .iter()
        .map(|clause| {
            clause
                .as_object()
                .ok_or_else(|| LedgerError::InvalidQuery(format!("{op} clauses must be objects")))
        })
        .collect()
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn match_field(field: Option<&Value>, condition: &Value) -> Result<bool> {
    if is_operator_object(condition)
        && let Value::Object(operators) = condition
    {
        for (op, operand) in operators {
            if !match_operator(field, op, operand)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    match (field, condition) {
        (Some(value), Value::Object(nested)) => match_selector(nested, value),
        (Some(value), expected) => Ok(value == expected),
        (None, _) => Ok(false),
    }
}

fn match_operator(field: Option<&Value>, op: &str, operand: &Value) -> Result<bool> {
    if op == "$exists" {
        let expected = operand
            .as_bool()
            .ok_or_else(|| LedgerError::InvalidQuery("$exists expects a boolean".to_string()))?;
        return Ok(field.is_some() == expected);
    }

    let Some(value) = field else {
        return Ok(false);
    };

    let matched = match op {
        "$eq" => value == operand,
        "$ne" => value != operand,
        "$in" => operand
            .as_array()
            .ok_or_else(|| LedgerError::InvalidQuery("$in expects an array".to_string()))?
            .contains(value),
        "$nin" => !operand
            .as_array()
            .ok_or_else(|| LedgerError::InvalidQuery("$nin expects an array".to_string()))?
            .contains(value),
        "$gt" => compare(value, operand) == Some(Ordering::Greater),
        "$gte" => matches!(
            compare(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$lt" => compare(value, operand) == Some(Ordering::Less),
        "$lte" => matches!(
            compare(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        other => {
            return Err(LedgerError::UnsupportedQuery(format!(
                "field operator {other}"
            )));
        }
    };
    Ok(matched)
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
