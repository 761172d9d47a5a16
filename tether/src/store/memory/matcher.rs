use std::cmp::Ordering;

use crate::common::{Document, Value, DOC_ID};
use crate::errors::{ErrorKind, TetherError, TetherResult};
use crate::store::SortOrder;

/// Evaluates a selector against a document.
///
/// Plain fields match by equality (an absent field equals `null`, an array
/// field matches when any element is equal). A field whose condition is a
/// document of `$`-operators is matched operator by operator. `$and` and
/// `$or` take arrays of sub-selectors.
pub(crate) fn matches(doc: &Document, filter: &Document) -> TetherResult<bool> {
    for (key, condition) in filter.iter() {
        let matched = match key.as_str() {
            "$and" => all_of(doc, condition)?,
            "$or" => any_of(doc, condition)?,
            _ => match_field(doc.get(key), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_filters(condition: &Value) -> TetherResult<Vec<&Document>> {
    let array = condition.as_array().ok_or_else(|| {
        TetherError::new("$and/$or expect an array of selectors", ErrorKind::InvalidOperation)
    })?;
    array
        .iter()
        .map(|item| {
            item.as_document().ok_or_else(|| {
                TetherError::new("$and/$or expect an array of selectors", ErrorKind::InvalidOperation)
            })
        })
        .collect()
}

fn all_of(doc: &Document, condition: &Value) -> TetherResult<bool> {
    for filter in sub_filters(condition)? {
        if !matches(doc, filter)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(doc: &Document, condition: &Value) -> TetherResult<bool> {
    for filter in sub_filters(condition)? {
        if matches(doc, filter)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_operator_document(condition: &Value) -> bool {
    match condition {
        Value::Document(doc) => !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn match_field(field: Option<&Value>, condition: &Value) -> TetherResult<bool> {
    if let (true, Value::Document(operators)) = (is_operator_document(condition), condition) {
        for (operator, operand) in operators.iter() {
            if !apply_operator(field, operator, operand)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    Ok(equals(field, condition))
}

fn equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) if !matches!(expected, Value::Array(_)) => {
            items.iter().any(|item| item == expected)
        }
        Some(value) => value == expected,
    }
}

fn comparable(a: &Value, b: &Value) -> bool {
    (a.is_number() && b.is_number()) || a.type_name() == b.type_name()
}

fn compare(field: Option<&Value>, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
    match field {
        Some(Value::Array(items)) if !matches!(operand, Value::Array(_)) => items
            .iter()
            .any(|item| comparable(item, operand) && accept(item.cmp(operand))),
        Some(value) => comparable(value, operand) && accept(value.cmp(operand)),
        None => false,
    }
}

fn apply_operator(field: Option<&Value>, operator: &str, operand: &Value) -> TetherResult<bool> {
    match operator {
        "$eq" => Ok(equals(field, operand)),
        "$ne" => Ok(!equals(field, operand)),
        "$gt" => Ok(compare(field, operand, |o| o == Ordering::Greater)),
        "$gte" => Ok(compare(field, operand, |o| o != Ordering::Less)),
        "$lt" => Ok(compare(field, operand, |o| o == Ordering::Less)),
        "$lte" => Ok(compare(field, operand, |o| o != Ordering::Greater)),
        "$in" | "$nin" => {
            let candidates = operand.as_array().ok_or_else(|| {
                TetherError::new(
                    &format!("{} expects an array", operator),
                    ErrorKind::InvalidOperation,
                )
            })?;
            let found = candidates.iter().any(|candidate| equals(field, candidate));
            Ok(if operator == "$in" { found } else { !found })
        }
        "$exists" => {
            let wanted = operand.as_bool().unwrap_or(true);
            Ok(field.is_some() == wanted)
        }
        _ => {
            log::error!("Unsupported selector operator {}", operator);
            Err(TetherError::new(
                &format!("Unsupported selector operator {}", operator),
                ErrorKind::InvalidOperation,
            ))
        }
    }
}

/// Orders two documents by a sort specification; absent fields sort as null.
pub(crate) fn compare_documents(a: &Document, b: &Document, sort: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        let ordering = match order {
            SortOrder::Ascending => left.cmp(right),
            SortOrder::Descending => right.cmp(left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::I64(i) => *i != 0,
        Value::F64(f) => *f != 0.0,
        Value::Null => false,
        _ => true,
    }
}

/// Applies an inclusion (`{name: 1}`) or exclusion (`{secret: 0}`)
/// projection. `_id` is kept unless excluded explicitly.
pub(crate) fn project(doc: Document, projection: &Document) -> Document {
    if projection.is_empty() {
        return doc;
    }

    let inclusive = projection
        .iter()
        .any(|(key, flag)| key != DOC_ID && truthy(flag));

    if inclusive {
        let keep_id = projection.get(DOC_ID).map(truthy).unwrap_or(true);
        doc.iter()
            .filter(|(key, _)| {
                if key.as_str() == DOC_ID {
                    keep_id
                } else {
                    projection.get(key).map(truthy).unwrap_or(false)
                }
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    } else {
        doc.iter()
            .filter(|(key, _)| projection.get(key).map(truthy).unwrap_or(true))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
