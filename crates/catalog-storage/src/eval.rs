//! Predicate and stage evaluation over JSON documents.

use catalog_core::{Document, Expr, Predicate, SortDirection, Stage, StoreError, StoreResult};
use regex::{Regex, RegexBuilder};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

/// A [`Predicate`] with its patterns compiled once per query.
pub(crate) enum Compiled {
    All,
    And(Vec<Compiled>),
    Or(Vec<Compiled>),
    Eq { field: String, value: String },
    Regex { field: String, re: Regex },
    NumericLt { field: String, bound: f64 },
}

pub(crate) fn compile(p: &Predicate) -> StoreResult<Compiled> {
    Ok(match p {
        Predicate::All => Compiled::All,
        Predicate::And { terms } => {
            Compiled::And(terms.iter().map(compile).collect::<StoreResult<_>>()?)
        }
        Predicate::Or { terms } => {
            Compiled::Or(terms.iter().map(compile).collect::<StoreResult<_>>()?)
        }
        Predicate::Eq { field, value } => Compiled::Eq {
            field: field.clone(),
            value: value.clone(),
        },
        Predicate::Regex {
            field,
            pattern,
            case_insensitive,
        } => {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(*case_insensitive)
                .build()
                .map_err(|e| StoreError::Execution(format!("bad pattern on {}: {}", field, e)))?;
            Compiled::Regex {
                field: field.clone(),
                re,
            }
        }
        Predicate::NumericLt { field, bound } => Compiled::NumericLt {
            field: field.clone(),
            bound: *bound,
        },
    })
}

impl Compiled {
    pub(crate) fn matches(&self, doc: &Document) -> StoreResult<bool> {
        match self {
            Compiled::All => Ok(true),
            Compiled::And(terms) => {
                for t in terms {
                    if !t.matches(doc)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Compiled::Or(terms) => {
                for t in terms {
                    if t.matches(doc)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Compiled::Eq { field, value } => Ok(match doc.get(field) {
                Some(JsonValue::String(s)) => s == value,
                Some(JsonValue::Array(items)) => items.iter().any(|v| v.as_str() == Some(value)),
                _ => false,
            }),
            Compiled::Regex { field, re } => Ok(match doc.get(field) {
                Some(JsonValue::String(s)) => re.is_match(s),
                Some(JsonValue::Array(items)) => items
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .any(|s| re.is_match(s)),
                _ => false,
            }),
            Compiled::NumericLt { field, bound } => {
                let v = to_double(field, doc.get(field))?;
                Ok(compare_values(&v, &JsonValue::from(*bound)) == Ordering::Less)
            }
        }
    }
}

/// Converts a field to a double. Missing and null stay null; text that is not a
/// number is an error rather than a silent null.
pub(crate) fn to_double(field: &str, v: Option<&JsonValue>) -> StoreResult<JsonValue> {
    match v {
        None | Some(JsonValue::Null) => Ok(JsonValue::Null),
        Some(JsonValue::Number(n)) => Ok(n.as_f64().map(JsonValue::from).unwrap_or_default()),
        Some(JsonValue::Bool(b)) => Ok(JsonValue::from(if *b { 1.0 } else { 0.0 })),
        Some(JsonValue::String(s)) => s.parse::<f64>().map(JsonValue::from).map_err(|_| {
            StoreError::Execution(format!("cannot convert {:?} in {} to double", s, field))
        }),
        Some(other) => Err(StoreError::Execution(format!(
            "cannot convert {} in {} to double",
            type_name(other),
            field
        ))),
    }
}

fn type_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn type_rank(v: &JsonValue) -> u8 {
    match v {
        JsonValue::Null => 0,
        JsonValue::Number(_) => 1,
        JsonValue::String(_) => 2,
        JsonValue::Object(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Bool(_) => 5,
    }
}

/// Total order across JSON types: null < numbers < strings < objects < arrays < bools.
pub(crate) fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (x, y) if type_rank(x) != type_rank(y) => type_rank(x).cmp(&type_rank(y)),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

fn eval_expr(expr: &Expr, doc: &Document) -> StoreResult<JsonValue> {
    match expr {
        Expr::ToDouble { field } => to_double(field, doc.get(field)),
    }
}

fn clamp(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Applies one stage to the rows produced by the previous one.
pub(crate) fn apply_stage(stage: &Stage, mut rows: Vec<Document>) -> StoreResult<Vec<Document>> {
    match stage {
        Stage::Match { predicate } => {
            let compiled = compile(predicate)?;
            let mut out = Vec::with_capacity(rows.len());
            for doc in rows {
                if compiled.matches(&doc)? {
                    out.push(doc);
                }
            }
            Ok(out)
        }
        Stage::DeriveField { name, expr } => {
            for doc in rows.iter_mut() {
                let v = eval_expr(expr, doc)?;
                doc.insert(name.clone(), v);
            }
            Ok(rows)
        }
        Stage::Sort { key, direction } => {
            // stable, so an earlier sort survives as the tiebreaker
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(key).unwrap_or(&JsonValue::Null),
                    b.get(key).unwrap_or(&JsonValue::Null),
                );
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
            Ok(rows)
        }
        Stage::Skip { n } => Ok(rows.into_iter().skip(clamp(*n)).collect()),
        Stage::Limit { n } => {
            rows.truncate(clamp(*n));
            Ok(rows)
        }
    }
}
