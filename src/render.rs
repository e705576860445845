//! Template rendering bridge.
//!
//! Invoked once per task at execution time, not during resolution: given a
//! task's argument map and a variable scope, produces a new map with every
//! string leaf rendered through a Jinja2-compatible engine (minijinja).
//! Non-string leaves pass through untouched.

use minijinja::Environment;
use serde_yaml::Value;

use crate::error::Result;
use crate::tasks::Fields;

/// Renders string leaves of task argument maps.
///
/// Undefined variables render as empty strings; template syntax errors and
/// unknown filters fail with the engine's diagnostic message.
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer configured for Ansible-style templates.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        Self { env }
    }

    /// Renders every string leaf in `fields` against `scope`, recursing
    /// into nested mappings and sequences.
    pub fn render_fields(&self, fields: &Fields, scope: &Fields) -> Result<Fields> {
        let context = minijinja::Value::from_serialize(scope);

        let mut rendered = Fields::with_capacity(fields.len());
        for (key, value) in fields {
            rendered.insert(key.clone(), self.render_value(value, &context)?);
        }

        Ok(rendered)
    }

    fn render_value(&self, value: &Value, context: &minijinja::Value) -> Result<Value> {
        match value {
            Value::String(template) => {
                let output = self.env.render_str(template, context)?;
                Ok(Value::String(output))
            }
            Value::Mapping(mapping) => {
                let mut out = serde_yaml::Mapping::new();
                for (key, nested) in mapping {
                    out.insert(key.clone(), self.render_value(nested, context)?);
                }
                Ok(Value::Mapping(out))
            }
            Value::Sequence(sequence) => {
                let mut out = Vec::with_capacity(sequence.len());
                for nested in sequence {
                    out.push(self.render_value(nested, context)?);
                }
                Ok(Value::Sequence(out))
            }
            other => Ok(other.clone()),
        }
    }
}
