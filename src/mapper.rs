//! Declarative wire-to-model field mapping.
//!
//! The remote API speaks PascalCase with nesting that varies per
//! resource. Instead of one bespoke reshaping routine per endpoint, each
//! resource declares a table of [`FieldSpec`]s and one generic routine
//! interprets it: `source` is a dot-path into the raw record (numeric
//! segments index arrays), `target` is a dot-path in the produced record,
//! and an optional transform coerces the value. Pure and synchronous.

use serde_json::{Map, Value};

pub type Transform = fn(&Value) -> Value;

pub struct FieldSpec {
    pub source: &'static str,
    pub target: &'static str,
    pub transform: Option<Transform>,
}

pub const fn field(source: &'static str, target: &'static str) -> FieldSpec {
    FieldSpec {
        source,
        target,
        transform: None,
    }
}

pub const fn field_with(
    source: &'static str,
    target: &'static str,
    transform: Transform,
) -> FieldSpec {
    FieldSpec {
        source,
        target,
        transform: Some(transform),
    }
}

/// Walk a dot-path into a raw record. Missing segments yield `None`.
pub fn lookup<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(raw, |value, segment| {
        match segment.parse::<usize>() {
            Ok(index) => value.get(index),
            Err(_) => value.get(segment),
        }
    })
}

/// Apply one mapping table to one raw record. Every target key is
/// produced; absent sources become `Value::Null`.
pub fn map_record(raw: &Value, spec: &[FieldSpec]) -> Value {
    let mut out = Map::with_capacity(spec.len());

    for field in spec {
        let source = lookup(raw, field.source).cloned().unwrap_or(Value::Null);
        let value = match field.transform {
            Some(transform) => transform(&source),
            None => source,
        };
        insert_path(&mut out, field.target, value);
    }

    Value::Object(out)
}

/// Map every element of a raw array. Non-arrays map to an empty list.
pub fn map_list(raw: &Value, spec: &[FieldSpec]) -> Vec<Value> {
    raw.as_array()
        .map(|items| items.iter().map(|item| map_record(item, spec)).collect())
        .unwrap_or_default()
}

fn insert_path(out: &mut Map<String, Value>, target: &str, value: Value) {
    match target.split_once('.') {
        None => {
            out.insert(target.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(nested) = entry {
                insert_path(nested, rest, value);
            }
        }
    }
}

/// `true`/missing completeness flag to the API's display labels.
pub fn complete_label(value: &Value) -> Value {
    Value::String(
        if value.as_bool().unwrap_or(false) {
            "Complete"
        } else {
            "Incomplete"
        }
        .to_string(),
    )
}

pub fn bool_flag(value: &Value) -> Value {
    Value::Bool(value.as_bool().unwrap_or(false))
}
