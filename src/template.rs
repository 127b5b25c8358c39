//! Template interpolation for connection URLs
//!
//! Handles `{{ variable }}` interpolation in the connection-descriptor templates.
//! Supports nested access like `{{ address.host }}`.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// `{{ name }}` or `{{ name.field }}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: Map<String, Value>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Builder-style variant of [`TemplateContext::set`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a value by path (e.g., "address.host")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let root = self.vars.get(parts.next()?)?;
        parts.try_fold(root, |current, part| match current {
            Value::Object(map) => map.get(part),
            _ => None,
        })
    }
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let result = PLACEHOLDER.replace_all(template, |cap: &regex::Captures<'_>| {
        match ctx.get(&cap[1]) {
            Some(value) => substitution(value),
            None => {
                missing.push(cap[1].to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(result.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Placeholder paths in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect()
}

fn substitution(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
