//! envcond Configuration Management
//!
//! Handles configuration from a TOML file and environment variables,
//! with defaults that reproduce the reference parsing behaviour.
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Input table layout
    pub input: InputConfig,

    /// Parsing behaviour
    pub parse: ParseConfig,

    /// Output graph settings
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Input
        if let Some(delimiter) = lookup("ENVCOND_DELIMITER") {
            self.input.delimiter = Some(parse_delimiter(&delimiter)?);
        }
        if let Some(column) = lookup("ENVCOND_SUBJECT_COLUMN") {
            self.input.subject_column = column;
        }
        if let Some(column) = lookup("ENVCOND_PREDICATE_COLUMN") {
            self.input.predicate_column = column;
        }
        if let Some(column) = lookup("ENVCOND_TEXT_COLUMN") {
            self.input.text_column = column;
        }

        // Parse
        if let Some(factor) = lookup("ENVCOND_FACTOR") {
            self.parse.factor = factor.parse()?;
        }
        if let Some(mode) = lookup("ENVCOND_GROUP_KEY") {
            self.parse.group_key = mode.parse()?;
        }
        if let Some(policy) = lookup("ENVCOND_NO_MATCH") {
            self.parse.no_match = policy.parse()?;
        }
        if let Some(window) = lookup("ENVCOND_LOOKBACK_CHARS") {
            self.parse.lookback_chars = window.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ENVCOND_LOOKBACK_CHARS".to_string(),
                value: window,
            })?;
        }

        // Output
        if let Some(format) = lookup("ENVCOND_OUTPUT_FORMAT") {
            self.output.format = format.parse()?;
        }
        if let Some(base) = lookup("ENVCOND_BASE_IRI") {
            self.output.base_iri = base;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parse.lookback_chars == 0 {
            return Err(ConfigError::InvalidValue {
                key: "parse.lookback_chars".to_string(),
                value: "0".to_string(),
            });
        }
        for (key, column) in [
            ("input.subject_column", &self.input.subject_column),
            ("input.predicate_column", &self.input.predicate_column),
            ("input.text_column", &self.input.text_column),
        ] {
            if column.trim().is_empty() {
                return Err(ConfigError::MissingRequired(key.to_string()));
            }
        }
        if !(self.output.base_iri.ends_with('/') || self.output.base_iri.ends_with('#')) {
            return Err(ConfigError::InvalidValue {
                key: "output.base_iri".to_string(),
                value: self.output.base_iri.clone(),
            });
        }
        Ok(())
    }
}

/// Parse a delimiter given as a single character or a name
pub fn parse_delimiter(value: &str) -> Result<char, ConfigError> {
    match value {
        "\\t" | "tab" | "\t" => Ok('\t'),
        "comma" => Ok(','),
        "semicolon" => Ok(';'),
        "pipe" => Ok('|'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c),
                _ => Err(ConfigError::InvalidValue {
                    key: "delimiter".to_string(),
                    value: value.to_string(),
                }),
            }
        }
    }
}

/// Input table layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Field delimiter (None = infer from file extension)
    pub delimiter: Option<char>,

    /// Header of the subject column
    pub subject_column: String,

    /// Header of the predicate column
    pub predicate_column: String,

    /// Header of the free-text column
    pub text_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            subject_column: "subject".to_string(),
            predicate_column: "predicate".to_string(),
            text_column: "value".to_string(),
        }
    }
}

/// Parsing behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Which factor profile to parse with
    pub factor: Factor,

    /// What identifies a shared parse group
    pub group_key: GroupKeyMode,

    /// What to emit when nothing matches
    pub no_match: NoMatchPolicy,

    /// Characters scanned before a value for qualifier cues
    pub lookback_chars: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            factor: Factor::Temperature,
            group_key: GroupKeyMode::RawText,
            no_match: NoMatchPolicy::WholeText,
            lookback_chars: 20,
        }
    }
}

/// Environmental factor being parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Temperature,
    Salinity,
    Ph,
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Salinity => write!(f, "salinity"),
            Self::Ph => write!(f, "ph"),
        }
    }
}

impl std::str::FromStr for Factor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temperature" | "temp" => Ok(Self::Temperature),
            "salinity" | "nacl" => Ok(Self::Salinity),
            "ph" => Ok(Self::Ph),
            _ => Err(ConfigError::InvalidValue {
                key: "factor".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Key under which parse groups are memoized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKeyMode {
    /// Identical text shares one group regardless of subject/predicate
    RawText,
    /// Groups are shared only within one (subject, predicate) pair
    SubjectPredicateText,
}

impl std::str::FromStr for GroupKeyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "raw_text" | "text" => Ok(Self::RawText),
            "subject_predicate_text" | "triple" => Ok(Self::SubjectPredicateText),
            _ => Err(ConfigError::InvalidValue {
                key: "group_key".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Behaviour when neither numeric nor categorical rules match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchPolicy {
    /// Emit exactly one component holding the whole text as unparsed
    WholeText,
    /// Emit no components
    Empty,
}

impl std::str::FromStr for NoMatchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "whole_text" | "strict" => Ok(Self::WholeText),
            "empty" | "permissive" => Ok(Self::Empty),
            _ => Err(ConfigError::InvalidValue {
                key: "no_match".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Output graph settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Serialization format
    pub format: OutputFormat,

    /// Namespace for parse nodes and properties
    pub base_iri: String,

    /// CURIE prefix expansions for subjects and predicates
    pub prefixes: BTreeMap<String, String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let prefixes = [
            ("NCBITaxon", "http://purl.obolibrary.org/obo/NCBITaxon_"),
            ("METPO", "http://purl.obolibrary.org/obo/METPO_"),
            ("RO", "http://purl.obolibrary.org/obo/RO_"),
            ("BFO", "http://purl.obolibrary.org/obo/BFO_"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            format: OutputFormat::NTriples,
            base_iri: "https://w3id.org/envcond/".to_string(),
            prefixes,
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    NTriples,
    Json,
}

impl OutputFormat {
    /// Guess the format from an output file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "nt" | "ntriples" => Some(Self::NTriples),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "ntriples" | "nt" => Ok(Self::NTriples),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "output.format".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.parse.factor, Factor::Temperature);
        assert_eq!(config.parse.group_key, GroupKeyMode::RawText);
        assert_eq!(config.parse.no_match, NoMatchPolicy::WholeText);
        assert_eq!(config.parse.lookback_chars, 20);
        assert_eq!(config.input.text_column, "value");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override() {
        let config = AppConfig::default()
            .apply_env(lookup_from(&[
                ("ENVCOND_FACTOR", "salinity"),
                ("ENVCOND_GROUP_KEY", "subject-predicate-text"),
                ("ENVCOND_NO_MATCH", "permissive"),
                ("ENVCOND_DELIMITER", "tab"),
                ("LOG_JSON", "true"),
            ]))
            .unwrap();

        assert_eq!(config.parse.factor, Factor::Salinity);
        assert_eq!(config.parse.group_key, GroupKeyMode::SubjectPredicateText);
        assert_eq!(config.parse.no_match, NoMatchPolicy::Empty);
        assert_eq!(config.input.delimiter, Some('\t'));
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_env_override_rejects_bad_values() {
        let result = AppConfig::default().apply_env(lookup_from(&[("ENVCOND_FACTOR", "humidity")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result =
            AppConfig::default().apply_env(lookup_from(&[("ENVCOND_LOOKBACK_CHARS", "many")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_toml_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[parse]\nfactor = \"ph\"\n\n[input]\ntext_column = \"raw_text\"\n\n[output.prefixes]\nGO = \"http://purl.obolibrary.org/obo/GO_\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.parse.factor, Factor::Ph);
        assert_eq!(config.parse.lookback_chars, 20);
        assert_eq!(config.input.text_column, "raw_text");
        assert_eq!(config.input.subject_column, "subject");
        assert!(config.output.prefixes.contains_key("GO"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = AppConfig::from_file("/nonexistent/envcond.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError { .. })));
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter("pipe").unwrap(), '|');
        assert!(parse_delimiter(",,").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_iri() {
        let mut config = AppConfig::default();
        config.output.base_iri = "https://example.org/envcond".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("N-Triples".parse::<OutputFormat>().unwrap(), OutputFormat::NTriples);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_extension("nt"), Some(OutputFormat::NTriples));
        assert!("turtle".parse::<OutputFormat>().is_err());
    }
}
