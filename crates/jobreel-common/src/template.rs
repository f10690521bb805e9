//! `{placeholder}` substitution for prompt and caption templates.

use std::collections::BTreeMap;

/// Variable substitution context.
///
/// Placeholders use the `{name}` syntax. Unknown placeholders are left in
/// place so callers can detect them with [`TemplateContext::unresolved`].
///
/// # Example
///
/// ```
/// use jobreel_common::TemplateContext;
///
/// let ctx = TemplateContext::new()
///     .with_var("role", "Backend Engineer")
///     .with_var("company", "Acme");
///
/// assert_eq!(
///     ctx.substitute("{role} at {company}, bright modern office"),
///     "Backend Engineer at Acme, bright modern office"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn with_var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Add a variable only when a value is present.
    pub fn with_opt_var(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => self.with_var(key, v.trim()),
            _ => self,
        }
    }

    /// Set a variable.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }

    /// Get a variable value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Substitute every known `{name}` in `template`.
    pub fn substitute(&self, template: &str) -> String {
        let mut result = template.to_string();
        for (key, value) in &self.vars {
            result = result.replace(&format!("{{{}}}", key), value);
        }
        result
    }

    /// Substitute variables in a list of templates.
    pub fn substitute_all(&self, templates: &[&str]) -> Vec<String> {
        templates.iter().map(|t| self.substitute(t)).collect()
    }

    /// Placeholder names in `template` that this context cannot fill.
    pub fn unresolved(&self, template: &str) -> Vec<String> {
        let mut missing = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else { break };
            let name = &after[..close];
            if !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !self.vars.contains_key(name)
                && !missing.iter().any(|m| m == name)
            {
                missing.push(name.to_string());
            }
            rest = &after[close + 1..];
        }
        missing
    }
}
