//! Template variable extraction and substitution.
//!
//! Placeholders are `{{name}}` tokens inside any text slot of a template body
//! (span text, headings, table headers, macro parameter values and so on).
//! Substitution is textual and single-pass: a supplied value is inserted as
//! plain text and is never parsed as markup or scanned for further
//! placeholders, so parameter values cannot alter document structure.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wikidoc_config::{Config, TemplateSettings};
use wikidoc_model::{visit_text, visit_text_mut, Document};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template parameter '{name}' has no value and no default")]
    MissingTemplateParameter { name: String },
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Kind of content a template produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateScope {
    Page,
    Issue,
}

/// Template body plus the metadata supplied by whoever discovered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub scope: TemplateScope,
    pub body: Document,
    /// Default values by placeholder name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, String>,
}

impl Template {
    pub fn new(id: impl Into<String>, scope: TemplateScope, body: Document) -> Self {
        Template {
            id: id.into(),
            scope,
            body,
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }
}

/// A placeholder found in a template. Required when `default` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TemplateParameter {
    pub name: String,
    pub default: Option<String>,
}

impl TemplateParameter {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}").expect("valid placeholder regex")
    })
}

fn legacy_placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}|\$([A-Za-z_][A-Za-z0-9_.-]*)\$")
            .expect("valid placeholder regex")
    })
}

fn placeholder_name<'t>(captures: &Captures<'t>) -> Option<&'t str> {
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|name| name.as_str())
}

/// Extracts and substitutes placeholders.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    settings: TemplateSettings,
}

impl TemplateEngine {
    pub fn new(settings: TemplateSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.template.clone())
    }

    fn regex(&self) -> &'static Regex {
        if self.settings.legacy_dollar_placeholders {
            legacy_placeholder_regex()
        } else {
            placeholder_regex()
        }
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholder_names(&self, body: &Document) -> Vec<String> {
        let regex = self.regex();
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        visit_text(body, &mut |text| {
            for captures in regex.captures_iter(text) {
                if let Some(name) = placeholder_name(&captures) {
                    if seen.insert(name.to_string()) {
                        names.push(name.to_string());
                    }
                }
            }
        });
        names
    }

    /// Every distinct placeholder, with its default when the template has one.
    pub fn extract_variables(&self, template: &Template) -> BTreeSet<TemplateParameter> {
        self.placeholder_names(&template.body)
            .into_iter()
            .map(|name| TemplateParameter {
                default: template.defaults.get(&name).cloned(),
                name,
            })
            .collect()
    }

    /// Produce a new document with every placeholder replaced.
    ///
    /// Supplied values win over defaults. Keys that match no placeholder are
    /// ignored. Fails on the first placeholder (in document order) that has
    /// neither.
    pub fn instantiate(
        &self,
        template: &Template,
        provided: &HashMap<String, String>,
    ) -> TemplateResult<Document> {
        let mut values = HashMap::new();
        for name in self.placeholder_names(&template.body) {
            let value = provided
                .get(&name)
                .or_else(|| template.defaults.get(&name))
                .ok_or_else(|| TemplateError::MissingTemplateParameter { name: name.clone() })?;
            values.insert(name, value.as_str());
        }

        let ignored = provided.keys().filter(|key| !values.contains_key(*key)).count();
        debug!(
            "instantiating template '{}' with {} placeholder(s), {} unused value(s)",
            template.id,
            values.len(),
            ignored
        );

        let regex = self.regex();
        let mut document = template.body.clone();
        visit_text_mut(&mut document, &mut |text| {
            if !regex.is_match(text) {
                return;
            }
            let replaced = regex.replace_all(text, |captures: &Captures<'_>| {
                placeholder_name(captures)
                    .and_then(|name| values.get(name))
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| captures[0].to_string())
            });
            *text = replaced.into_owned();
        });
        Ok(document)
    }
}

/// Extract placeholders with the default `{{name}}` syntax only.
pub fn extract_variables(template: &Template) -> BTreeSet<TemplateParameter> {
    TemplateEngine::default().extract_variables(template)
}

/// Instantiate with the default `{{name}}` syntax only.
pub fn instantiate(
    template: &Template,
    provided: &HashMap<String, String>,
) -> TemplateResult<Document> {
    TemplateEngine::default().instantiate(template, provided)
}
