//! envcond Core - Domain models, errors, and shared configuration
//!
//! This crate defines the types shared by the parsing pipeline:
//! - Input rows (`RawTriple`)
//! - Parse structures (`ParseGroup`, `ParseComponent`, `QualifierLabel`)
//! - Output edges (`Edge`)
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, Factor, GroupKeyMode, InputConfig, LoggingConfig, NoMatchPolicy,
    OutputConfig, OutputFormat, ParseConfig,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for envcond operations
#[derive(Error, Debug)]
pub enum EnvcondError {
    #[error("Missing required column '{column}' in {input}")]
    MissingColumn { column: String, input: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input table error: {0}")]
    InputError(String),

    #[error("Invalid pattern in profile '{profile}': {message}")]
    InvalidPattern { profile: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EnvcondError>;

// ============================================================================
// Input Rows
// ============================================================================

/// One row of the source trait table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTriple {
    /// Subject identifier (usually a taxon CURIE)
    pub subject: String,

    /// Predicate identifier
    pub predicate: String,

    /// Free-text condition value, verbatim
    pub raw_text: String,

    /// 1-based row number in the source table (header excluded)
    pub row: usize,
}

impl RawTriple {
    /// Create a new raw triple
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        raw_text: impl Into<String>,
        row: usize,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            raw_text: raw_text.into(),
            row,
        }
    }

    /// Value identity of the triple, ignoring where it came from
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.subject, &self.predicate, &self.raw_text)
    }
}

// ============================================================================
// Parse Structures
// ============================================================================

/// Marks a spot value as a bound or extremum rather than an exact measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualifierLabel {
    Minimum,
    Maximum,
    Optimum,
}

impl QualifierLabel {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Optimum => "optimum",
        }
    }
}

impl std::fmt::Display for QualifierLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QualifierLabel {
    type Err = EnvcondError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "minimum" => Ok(Self::Minimum),
            "maximum" => Ok(Self::Maximum),
            "optimum" => Ok(Self::Optimum),
            _ => Err(EnvcondError::ValidationError(format!(
                "unknown qualifier label: {s}"
            ))),
        }
    }
}

/// One interpreted unit of a free-text value.
///
/// Fields are private so that `minimum_value` and `maximum_value` can only
/// be set together, through [`ParseComponent::range`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseComponent {
    component_text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    maximum_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    spot_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    qualifier_label: Option<QualifierLabel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    categorical_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    unparsed_text: Option<String>,
}

impl ParseComponent {
    fn bare(component_text: impl Into<String>) -> Self {
        Self {
            component_text: component_text.into(),
            minimum_value: None,
            maximum_value: None,
            spot_value: None,
            unit: None,
            qualifier_label: None,
            categorical_label: None,
            unparsed_text: None,
        }
    }

    /// A two-sided range. Values are kept in the order given.
    pub fn range(
        component_text: impl Into<String>,
        minimum: f64,
        maximum: f64,
        unit: impl Into<String>,
    ) -> Self {
        let mut component = Self::bare(component_text);
        component.minimum_value = Some(minimum);
        component.maximum_value = Some(maximum);
        component.unit = Some(unit.into());
        component
    }

    /// A single measured value
    pub fn spot(component_text: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        let mut component = Self::bare(component_text);
        component.spot_value = Some(value);
        component.unit = Some(unit.into());
        component
    }

    /// A keyword-derived category
    pub fn categorical(component_text: impl Into<String>, label: impl Into<String>) -> Self {
        let mut component = Self::bare(component_text);
        component.categorical_label = Some(label.into());
        component
    }

    /// Text that no rule could interpret
    pub fn unparsed(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut component = Self::bare(text.clone());
        component.unparsed_text = Some(text);
        component
    }

    /// Attach a qualifier label
    pub fn with_qualifier(mut self, qualifier: QualifierLabel) -> Self {
        self.qualifier_label = Some(qualifier);
        self
    }

    pub fn component_text(&self) -> &str {
        &self.component_text
    }

    pub fn minimum_value(&self) -> Option<f64> {
        self.minimum_value
    }

    pub fn maximum_value(&self) -> Option<f64> {
        self.maximum_value
    }

    pub fn spot_value(&self) -> Option<f64> {
        self.spot_value
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn qualifier_label(&self) -> Option<QualifierLabel> {
        self.qualifier_label
    }

    pub fn categorical_label(&self) -> Option<&str> {
        self.categorical_label.as_deref()
    }

    pub fn unparsed_text(&self) -> Option<&str> {
        self.unparsed_text.as_deref()
    }

    /// True when the component carries a numeric value
    pub fn is_numeric(&self) -> bool {
        self.minimum_value.is_some() || self.spot_value.is_some()
    }
}

/// Structured wrapper around one source free-text value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseGroup {
    /// Synthetic identifier
    pub id: Uuid,

    /// Source text, verbatim
    pub raw_text: String,

    /// Interpreted components, in text order
    pub components: Vec<ParseComponent>,
}

impl ParseGroup {
    /// Create a new parse group; `raw_text` must not be blank
    pub fn new(id: Uuid, raw_text: impl Into<String>, components: Vec<ParseComponent>) -> Result<Self> {
        let raw_text = raw_text.into();
        if raw_text.trim().is_empty() {
            return Err(EnvcondError::ValidationError(
                "parse group raw_text must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id,
            raw_text,
            components,
        })
    }
}

/// A (subject, predicate, group) edge of the output graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub subject: String,
    pub predicate: String,
    pub group: Uuid,
}

// ============================================================================
// Tests
// ============================================================================
