//! Secret-safe string templating
//!
//! User stories, URLs and fill texts may reference variables as `{{name}}`.
//! A [`VariableString`] exposes two projections of such a template:
//!
//! - [`VariableString::masked_value`] keeps secret variables as their literal
//!   `{{name}}` token. This is the only form that may reach prompts, logs,
//!   reporters or the task ledger.
//! - [`VariableString::resolved_value`] substitutes every known variable. This
//!   is the only form that may reach the browser.
//!
//! Substitution is a single non-recursive pass with non-greedy `{{...}}`
//! matching; unknown names are left untouched in both projections.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use serde::Deserialize;

static VARIABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid variable pattern"));

/// A named value that can be referenced from templates
#[derive(Clone, Deserialize)]
pub struct Variable {
    name: String,
    value: String,
    #[serde(rename = "is_secret", default)]
    secret: bool,
}

impl Variable {
    /// Create a plain variable
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            secret: false,
        }
    }

    /// Create a secret variable
    pub fn secret(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            secret: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// The `{{name}}` token referencing this variable
    pub fn token(&self) -> String {
        format!("{{{{{}}}}}", self.name)
    }

    fn masked(&self) -> String {
        if self.secret {
            self.token()
        } else {
            self.value.clone()
        }
    }

    fn resolved(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.secret { "<redacted>" } else { self.value.as_str() };
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("value", &value)
            .field("secret", &self.secret)
            .finish()
    }
}

/// The variable set active for one run
pub type VariableSet = Arc<[Variable]>;

/// Replace every secret value occurring in `text` with its `{{name}}` token.
/// For free text that did not come from a template, such as error messages
/// echoing a resolved URL.
pub fn redact_secrets(variables: &[Variable], text: &str) -> String {
    let mut secrets: Vec<&Variable> = variables
        .iter()
        .filter(|v| v.secret && !v.value.is_empty())
        .collect();
    // longest first so a secret containing another is replaced whole
    secrets.sort_by(|a, b| b.value.len().cmp(&a.value.len()));

    secrets
        .into_iter()
        .fold(text.to_string(), |acc, var| acc.replace(&var.value, &var.token()))
}

/// An immutable template bound to a variable set
#[derive(Clone)]
pub struct VariableString {
    template: String,
    variables: VariableSet,
}

impl VariableString {
    pub fn new(template: impl Into<String>, variables: VariableSet) -> Self {
        Self {
            template: template.into(),
            variables,
        }
    }

    /// Template with non-secret variables substituted
    pub fn masked_value(&self) -> String {
        self.interpolate(|var| var.masked())
    }

    /// Template with every known variable substituted
    pub fn resolved_value(&self) -> String {
        self.interpolate(|var| var.resolved().to_string())
    }

    fn interpolate(&self, project: impl Fn(&Variable) -> String) -> String {
        VARIABLE_PATTERN
            .replace_all(&self.template, |caps: &Captures| {
                match self.variables.iter().find(|v| v.name == caps[1]) {
                    Some(var) => project(var),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl fmt::Debug for VariableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VariableString")
            .field(&self.masked_value())
            .finish()
    }
}

impl fmt::Display for VariableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked_value())
    }
}
