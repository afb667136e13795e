//! Per-check settings schemas.
//!
//! A [`Schema`] names the keys a check accepts on top of the common
//! `level` and `ignore_types` keys. Validation either yields a typed
//! [`CheckSettings`] or a map from key to error messages.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::Level;

/// Shape of a schema key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single string.
    Str,
    /// A list of strings.
    StrList,
    /// One string out of a fixed set.
    Choice(&'static [&'static str]),
    /// A list of strings, each out of a fixed set.
    MultiChoice(&'static [&'static str]),
}

#[derive(Debug, Clone)]
struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    required: bool,
    default: Option<&'static str>,
}

/// Settings schema of one check.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

/// Errors of one check entry, keyed by setting name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

impl Schema {
    /// Creates a schema with only the common keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required key.
    #[must_use]
    pub fn required(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind,
            required: true,
            default: None,
        });
        self
    }

    /// Adds an optional key with an optional string default.
    #[must_use]
    pub fn optional(
        mut self,
        name: &'static str,
        kind: FieldKind,
        default: Option<&'static str>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind,
            required: false,
            default,
        });
        self
    }

    /// Names of the check-specific keys.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Validates the keyword arguments of one check entry.
    ///
    /// Unknown keys are ignored; the `id` key is never inspected.
    ///
    /// # Errors
    ///
    /// Returns the messages of every failing key.
    pub fn validate(&self, kwargs: &Map<String, Value>) -> Result<CheckSettings, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut settings = CheckSettings::default();

        match kwargs.get("level") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(value) => match value.as_str().and_then(exact_level) {
                Some(level) => settings.level = Some(level),
                None => push(&mut errors, "level", invalid_choice(value)),
            },
        }

        match kwargs.get("ignore_types").map(string_list) {
            None => {}
            Some(Err(msg)) => push(&mut errors, "ignore_types", msg),
            Some(Ok(entries)) => {
                for entry in entries {
                    if is_import_path(&entry) {
                        settings.ignore_types.insert(entry);
                    } else {
                        push(
                            &mut errors,
                            "ignore_types",
                            format!("ignore_types contains entry that can't be imported: '{entry}'."),
                        );
                        break;
                    }
                }
            }
        }

        for spec in &self.fields {
            match validate_field(spec, kwargs.get(spec.name)) {
                Ok(Some(value)) => {
                    settings.params.insert(spec.name.to_owned(), value);
                }
                Ok(None) => {}
                Err(msgs) => {
                    errors.entry(spec.name.to_owned()).or_default().extend(msgs);
                }
            }
        }

        if errors.is_empty() {
            Ok(settings)
        } else {
            Err(errors)
        }
    }
}

/// Validated settings of one check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckSettings {
    /// Severity override.
    pub level: Option<Level>,
    /// Dotted class paths whose instances the check never evaluates.
    pub ignore_types: BTreeSet<String>,
    /// Check-specific values, coerced to their schema shape.
    pub params: BTreeMap<String, Value>,
}

impl CheckSettings {
    /// A string parameter.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// A string-list parameter; missing parameters give an empty list.
    #[must_use]
    pub fn list(&self, name: &str) -> Vec<String> {
        self.params
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn push(errors: &mut FieldErrors, key: &str, msg: String) {
    errors.entry(key.to_owned()).or_default().push(msg);
}

fn exact_level(value: &str) -> Option<Level> {
    Level::NAMES
        .contains(&value)
        .then(|| Level::parse(value))
        .flatten()
}

/// Text of a user value the way error messages quote it.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn invalid_choice(value: &Value) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        display_value(value)
    )
}

/// Coerces a list value. Falsy values count as an empty list.
pub(crate) fn string_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Null | Value::Bool(false) => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().map(display_value).collect()),
        _ => Err("Enter a list of values.".to_owned()),
    }
}

fn is_import_path(entry: &str) -> bool {
    let Some((module, name)) = entry.rsplit_once('.') else {
        return false;
    };
    let ident = |s: &str| {
        let mut chars = s.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
    };
    ident(name) && module.split('.').all(ident)
}

fn validate_field(spec: &FieldSpec, value: Option<&Value>) -> Result<Option<Value>, Vec<String>> {
    let required = || vec!["This field is required.".to_owned()];
    let value = value.filter(|v| !v.is_null());
    match spec.kind {
        FieldKind::Str | FieldKind::Choice(_) => {
            let text = match value {
                None => None,
                Some(Value::String(s)) if s.is_empty() => None,
                Some(v) => Some(display_value(v)),
            };
            let Some(text) = text else {
                if spec.required {
                    return Err(required());
                }
                return Ok(spec.default.map(|d| Value::String(d.to_owned())));
            };
            if let FieldKind::Choice(choices) = spec.kind {
                if !choices.contains(&text.as_str()) {
                    return Err(vec![invalid_choice(&Value::String(text))]);
                }
            }
            Ok(Some(Value::String(text)))
        }
        FieldKind::StrList | FieldKind::MultiChoice(_) => {
            let items = match value {
                None => Vec::new(),
                Some(v) => string_list(v).map_err(|e| vec![e])?,
            };
            if items.is_empty() {
                if spec.required {
                    return Err(required());
                }
                return Ok(spec
                    .default
                    .map(|d| Value::Array(vec![Value::String(d.to_owned())])));
            }
            if let FieldKind::MultiChoice(choices) = spec.kind {
                if let Some(bad) = items.iter().find(|i| !choices.contains(&i.as_str())) {
                    return Err(vec![invalid_choice(&Value::String(bad.clone()))]);
                }
            }
            Ok(Some(Value::Array(items.into_iter().map(Value::String).collect())))
        }
    }
}
