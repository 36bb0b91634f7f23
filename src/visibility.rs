//! Which fields of a derived form are currently active.
//!
//! Evaluation is a single hop: a clause compares its parent's submitted
//! value with the expected value and nothing else. Whether the parent is
//! itself hidden is not considered, so chains of dependencies are not
//! followed.

use serde_json::Value;
use std::collections::HashSet;

use crate::schema::{DependencyRule, FormSchema, FormValues, OrderedMap};

/// Dependent fields split by whether a satisfied clause shows them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    pub shown: Vec<String>,
    pub hidden: Vec<String>,
}

impl Visibility {
    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.iter().any(|f| f == field)
    }
}

/// Fields to enforce and fields to leave out of the form right now
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFields {
    pub required: Vec<String>,
    pub hidden: Vec<String>,
}

impl ActiveFields {
    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.iter().any(|f| f == field)
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.iter().any(|f| f == field)
    }
}

/// Exact comparison of a submitted value with a clause's expected value.
///
/// Follows JSON Schema `const`: the types must agree, so `3` does not match
/// `"3"`, while `3` and `3.0` are the same number. Null, arrays and objects
/// never match, and neither does a missing value.
pub fn values_match(submitted: Option<&Value>, expected: &Value) -> bool {
    match (submitted, expected) {
        (Some(Value::String(a)), Value::String(b)) => a == b,
        (Some(Value::Bool(a)), Value::Bool(b)) => a == b,
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        _ => false,
    }
}

/// Evaluate every dependency rule against the submitted values
pub fn evaluate(dependencies: &OrderedMap<DependencyRule>, values: &FormValues) -> Visibility {
    let mut dependents: Vec<&str> = Vec::new();
    let mut shown: HashSet<&str> = HashSet::new();

    for (parent, rule) in dependencies.iter() {
        let submitted = values.get(parent);
        for clause in &rule.one_of {
            for field in &clause.required {
                if !dependents.contains(&field.as_str()) {
                    dependents.push(field);
                }
            }
            let satisfied = clause
                .expected_value(parent)
                .map(|expected| values_match(submitted, expected))
                .unwrap_or(false);
            if satisfied {
                shown.extend(clause.required.iter().map(String::as_str));
            }
        }
    }

    let (shown, hidden): (Vec<&str>, Vec<&str>) =
        dependents.into_iter().partition(|f| shown.contains(f));
    Visibility {
        shown: shown.into_iter().map(str::to_string).collect(),
        hidden: hidden.into_iter().map(str::to_string).collect(),
    }
}

/// Required and hidden fields of `schema` under the submitted values.
///
/// Flat required fields stay required unless hidden; dependents shown by a
/// satisfied clause become required while the clause holds.
pub fn active_fields(schema: &FormSchema, values: &FormValues) -> ActiveFields {
    let visibility = evaluate(&schema.dependencies, values);

    let mut required: Vec<String> = Vec::new();
    let candidates = schema.required.iter().chain(visibility.shown.iter());
    for field in candidates {
        if !visibility.is_hidden(field) && !required.contains(field) {
            required.push(field.clone());
        }
    }

    ActiveFields {
        required,
        hidden: visibility.hidden,
    }
}

/// The form description a renderer should present right now: hidden fields
/// are removed and `required` lists the active required fields
pub fn active_schema(schema: &FormSchema, values: &FormValues) -> FormSchema {
    let active = active_fields(schema, values);
    let mut subset = schema.clone();
    subset.properties.retain(|name, _| !active.is_hidden(name));
    subset.required = active
        .required
        .into_iter()
        .filter(|f| subset.properties.contains_key(f))
        .collect();
    subset
}
