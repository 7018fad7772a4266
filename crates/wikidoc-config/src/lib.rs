//! Configuration primitives and loader for the wikidoc engine.
//!
//! Settings are resolved through a precedence stack:
//! override path → working directory → git root → built-in defaults.
//! Each layer only overrides the fields it names. Every setting has a usable
//! default, so library callers can ignore files entirely and use
//! [`Config::default`].

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".wikidoc.toml";

const DEFAULT_NEW_SECTION_LEVEL: u8 = 2;
const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.6;

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub format: FormatSettings,
    pub edit: EditSettings,
    pub template: TemplateSettings,
    pub sources: ConfigSources,
}

/// Settings that shape the storage markup written by the formatter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatSettings {
    /// Emit a newline after every block-level element.
    pub line_breaks: bool,
    /// Pad short table rows with empty cells up to the header width.
    pub pad_ragged_rows: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        FormatSettings {
            line_breaks: true,
            pad_ragged_rows: true,
        }
    }
}

/// Settings for section lookup and the edit engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSettings {
    /// Append a new section instead of failing when a lookup misses.
    pub create_if_absent: bool,
    /// Heading level used for sections created by the engine.
    pub new_section_level: u8,
    /// Minimum similarity for "did you mean" hints on missing sections.
    pub suggestion_threshold: f64,
    /// Attach a unified diff of the markup to every edit outcome.
    pub diff: bool,
}

impl Default for EditSettings {
    fn default() -> Self {
        EditSettings {
            create_if_absent: false,
            new_section_level: DEFAULT_NEW_SECTION_LEVEL,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            diff: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateSettings {
    /// Also treat `$name$` tokens as placeholders.
    pub legacy_dollar_placeholders: bool,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn default() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options supplied by the embedding application.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = PartialConfig::default();
        let mut source_layers = vec![ConfigSource::default()];

        let git_config_path = find_git_root(&working_dir).map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            format: resolved.format,
            edit: resolved.edit,
            template: resolved.template,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Parses a single TOML document on top of the built-in defaults, without
    /// touching the filesystem.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let source = ConfigSource::for_file(ConfigSourceKind::Override, PathBuf::from("<inline>"));
        let partial = parse_layer(contents, source.clone()).map_err(|err| match err {
            LayerParseError::Parse { source } => ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            },
        })?;
        let resolved = partial.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            format: resolved.format,
            edit: resolved.edit,
            template: resolved.template,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default(), source],
            },
        })
    }
}

impl Default for Config {
    /// Built-in defaults only; no files are consulted.
    fn default() -> Self {
        Config {
            format: FormatSettings::default(),
            edit: EditSettings::default(),
            template: TemplateSettings::default(),
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default()],
            },
        }
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    parse_layer(&contents, source).map_err(|err| match err {
        LayerParseError::Parse { source } => ConfigError::Parse {
            path: path.into(),
            source,
        },
    })
}

fn parse_layer(contents: &str, source: ConfigSource) -> Result<PartialConfig, LayerParseError> {
    let raw: RawConfig =
        toml::from_str(contents).map_err(|source| LayerParseError::Parse { source })?;
    Ok(raw.into_partial(source))
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Debug)]
enum LayerParseError {
    Parse { source: toml::de::Error },
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    format: FormatPartial,
    edit: EditPartial,
    template: TemplatePartial,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        self.format.merge(other.format);
        self.edit.merge(other.edit);
        self.template.merge(other.template);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let format_defaults = FormatSettings::default();
        let edit_defaults = EditSettings::default();
        let template_defaults = TemplateSettings::default();

        let new_section_level = self.edit.new_section_level.map(|located| {
            if !(1..=6).contains(&located.value) {
                errors.push(ConfigValidationError::new(
                    Some(located.source.clone()),
                    format!(
                        "edit.new_section_level must be between 1 and 6 (received {})",
                        located.value
                    ),
                ));
            }
            located.value
        });

        let suggestion_threshold = self.edit.suggestion_threshold.map(|located| {
            if !(0.0..=1.0).contains(&located.value) {
                errors.push(ConfigValidationError::new(
                    Some(located.source.clone()),
                    format!(
                        "edit.suggestion_threshold must be between 0.0 and 1.0 (received {})",
                        located.value
                    ),
                ));
            }
            located.value
        });

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            format: FormatSettings {
                line_breaks: value_or(self.format.line_breaks, format_defaults.line_breaks),
                pad_ragged_rows: value_or(
                    self.format.pad_ragged_rows,
                    format_defaults.pad_ragged_rows,
                ),
            },
            edit: EditSettings {
                create_if_absent: value_or(
                    self.edit.create_if_absent,
                    edit_defaults.create_if_absent,
                ),
                new_section_level: new_section_level.unwrap_or(edit_defaults.new_section_level),
                suggestion_threshold: suggestion_threshold
                    .unwrap_or(edit_defaults.suggestion_threshold),
                diff: value_or(self.edit.diff, edit_defaults.diff),
            },
            template: TemplateSettings {
                legacy_dollar_placeholders: value_or(
                    self.template.legacy_dollar_placeholders,
                    template_defaults.legacy_dollar_placeholders,
                ),
            },
        })
    }
}

fn value_or<T>(located: Option<Located<T>>, default: T) -> T {
    located.map(|located| located.value).unwrap_or(default)
}

#[derive(Clone, Debug, Default)]
struct FormatPartial {
    line_breaks: Option<Located<bool>>,
    pad_ragged_rows: Option<Located<bool>>,
}

impl FormatPartial {
    fn merge(&mut self, other: FormatPartial) {
        if other.line_breaks.is_some() {
            self.line_breaks = other.line_breaks;
        }
        if other.pad_ragged_rows.is_some() {
            self.pad_ragged_rows = other.pad_ragged_rows;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct EditPartial {
    create_if_absent: Option<Located<bool>>,
    new_section_level: Option<Located<u8>>,
    suggestion_threshold: Option<Located<f64>>,
    diff: Option<Located<bool>>,
}

impl EditPartial {
    fn merge(&mut self, other: EditPartial) {
        if other.create_if_absent.is_some() {
            self.create_if_absent = other.create_if_absent;
        }
        if other.new_section_level.is_some() {
            self.new_section_level = other.new_section_level;
        }
        if other.suggestion_threshold.is_some() {
            self.suggestion_threshold = other.suggestion_threshold;
        }
        if other.diff.is_some() {
            self.diff = other.diff;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct TemplatePartial {
    legacy_dollar_placeholders: Option<Located<bool>>,
}

impl TemplatePartial {
    fn merge(&mut self, other: TemplatePartial) {
        if other.legacy_dollar_placeholders.is_some() {
            self.legacy_dollar_placeholders = other.legacy_dollar_placeholders;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    format: FormatSettings,
    edit: EditSettings,
    template: TemplateSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError { source, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    format: Option<RawFormat>,
    #[serde(default)]
    edit: Option<RawEdit>,
    #[serde(default)]
    template: Option<RawTemplate>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            format: self
                .format
                .map(|format| format.into_partial(&source))
                .unwrap_or_default(),
            edit: self
                .edit
                .map(|edit| edit.into_partial(&source))
                .unwrap_or_default(),
            template: self
                .template
                .map(|template| template.into_partial(&source))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFormat {
    #[serde(default)]
    line_breaks: Option<bool>,
    #[serde(default)]
    pad_ragged_rows: Option<bool>,
}

impl RawFormat {
    fn into_partial(self, source: &ConfigSource) -> FormatPartial {
        FormatPartial {
            line_breaks: self.line_breaks.map(|value| Located::new(value, source.clone())),
            pad_ragged_rows: self
                .pad_ragged_rows
                .map(|value| Located::new(value, source.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEdit {
    #[serde(default)]
    create_if_absent: Option<bool>,
    #[serde(default)]
    new_section_level: Option<u8>,
    #[serde(default)]
    suggestion_threshold: Option<f64>,
    #[serde(default)]
    diff: Option<bool>,
}

impl RawEdit {
    fn into_partial(self, source: &ConfigSource) -> EditPartial {
        EditPartial {
            create_if_absent: self
                .create_if_absent
                .map(|value| Located::new(value, source.clone())),
            new_section_level: self
                .new_section_level
                .map(|value| Located::new(value, source.clone())),
            suggestion_threshold: self
                .suggestion_threshold
                .map(|value| Located::new(value, source.clone())),
            diff: self.diff.map(|value| Located::new(value, source.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplate {
    #[serde(default)]
    legacy_dollar_placeholders: Option<bool>,
}

impl RawTemplate {
    fn into_partial(self, source: &ConfigSource) -> TemplatePartial {
        TemplatePartial {
            legacy_dollar_placeholders: self
                .legacy_dollar_placeholders
                .map(|value| Located::new(value, source.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_toml_overrides_single_fields() {
        let config = Config::from_toml_str(
            r#"
            [edit]
            new_section_level = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.edit.new_section_level, 3);
        assert!(config.edit.diff);
        assert_eq!(config.format, FormatSettings::default());
    }

    #[test]
    fn validation_collects_every_failure() {
        let err = Config::from_toml_str(
            r#"
            [edit]
            new_section_level = 9
            suggestion_threshold = 1.5
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.iter().count(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = Config::from_toml_str("[format]\nwrap = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
