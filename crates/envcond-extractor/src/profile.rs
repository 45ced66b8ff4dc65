//! Factor profiles
//!
//! A `FactorProfile` bundles every vocabulary the pipeline needs for one
//! environmental factor: characters to normalize, unit notation rewrites,
//! unit markers, qualifier cues and the categorical keyword table. Profiles
//! are plain serde data, so a custom one can be built or deserialized and
//! injected without touching the extractor code.

use serde::{Deserialize, Serialize};

use envcond_core::{Factor, QualifierLabel};

// ============================================================================
// Profile building blocks
// ============================================================================

/// Where a unit marker sits relative to its number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPlacement {
    /// `37°C`
    Trailing,
    /// `pH 7`
    Leading,
}

/// A unit marker as it appears in normalized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMarker {
    /// Regex matching the canonical marker
    pub pattern: String,
    /// Unit symbol written to the `unit` field
    pub symbol: String,
    pub placement: UnitPlacement,
}

/// A regex rewrite applied during normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotationRewrite {
    pub pattern: String,
    pub replacement: String,
}

/// A phrase or symbol that marks a value as a bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifierCue {
    pub cue: String,
    pub qualifier: QualifierLabel,
}

/// One class of the categorical vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryClass {
    /// Label written to `categorical_label`
    pub label: String,
    /// Surface patterns (regex, matched case-insensitively at a word start)
    pub patterns: Vec<String>,
}

// ============================================================================
// Factor profile
// ============================================================================

/// Immutable vocabulary bundle for one environmental factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorProfile {
    pub name: String,

    /// Characters rewritten to ASCII `-`
    pub dashes: Vec<char>,

    /// Characters rewritten to ASCII space
    pub spaces: Vec<char>,

    /// Characters removed outright
    pub format_chars: Vec<char>,

    /// Unit notation rewrites, applied in order
    pub notation: Vec<NotationRewrite>,

    /// Unit markers; earlier entries win on equal spans
    pub units: Vec<UnitMarker>,

    /// Qualifier cue table
    pub cues: Vec<QualifierCue>,

    /// Categorical vocabulary in priority order
    pub vocabulary: Vec<CategoryClass>,

    /// Characters scanned before a value for qualifier cues
    pub lookback_chars: usize,
}

impl FactorProfile {
    /// Built-in profile for a factor
    pub fn for_factor(factor: Factor) -> Self {
        match factor {
            Factor::Temperature => Self::temperature(),
            Factor::Salinity => Self::salinity(),
            Factor::Ph => Self::ph(),
        }
    }

    /// Override the qualifier lookback window
    pub fn with_lookback(mut self, chars: usize) -> Self {
        self.lookback_chars = chars;
        self
    }

    /// Shared character tables and cues, with no units or vocabulary
    fn base(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dashes: vec![
                '\u{2010}', // hyphen
                '\u{2011}', // non-breaking hyphen
                '\u{2012}', // figure dash
                '\u{2013}', // en dash
                '\u{2014}', // em dash
                '\u{2015}', // horizontal bar
                '\u{2212}', // minus sign
                '\u{FE58}',
                '\u{FE63}',
                '\u{FF0D}',
            ],
            spaces: vec![
                '\u{00A0}', '\u{1680}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}',
                '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}', '\u{202F}',
                '\u{205F}', '\u{3000}',
            ],
            format_chars: vec![
                '\u{00AD}', // soft hyphen
                '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}',
            ],
            notation: Vec::new(),
            units: Vec::new(),
            cues: default_cues(),
            vocabulary: Vec::new(),
            lookback_chars: 20,
        }
    }

    /// Growth temperature in degrees Celsius
    pub fn temperature() -> Self {
        let mut profile = Self::base("temperature");
        profile.notation = vec![
            rewrite("℃", "°C"),
            rewrite(r"(?i)\s*(?:°|º|˚|deg(?:ree)?s?\.?)\s*c(?:elsius)?\b", "°C"),
            rewrite(r"([0-9])\s*o\s*C\b", "${1}°C"),
        ];
        profile.units = vec![unit(r"°C", "Cel", UnitPlacement::Trailing)];
        profile.vocabulary = vec![
            class("hyperthermophile", &[r"hyper-?thermophil\w*"]),
            class("thermophile", &[r"thermophil\w*"]),
            class("thermotolerant", &[r"thermo-?toleran\w*"]),
            class("mesophile", &[r"mesophil\w*"]),
            class("psychrotolerant", &[r"psychro-?toleran\w*", r"psychrotroph\w*"]),
            class("psychrophile", &[r"psychrophil\w*", r"cryophil\w*"]),
        ];
        profile
    }

    /// Salt concentration (percent, molar, grams per litre)
    pub fn salinity() -> Self {
        let mut profile = Self::base("salinity");
        profile.notation = vec![
            rewrite(r"(?i)\s*%\s*\(\s*w\s*/\s*v\s*\)", "%"),
            rewrite(r"\s+%", "%"),
        ];
        profile.units = vec![
            unit(r"%", "%", UnitPlacement::Trailing),
            unit(r"mM\b", "mmol/L", UnitPlacement::Trailing),
            unit(r"M\b", "mol/L", UnitPlacement::Trailing),
            unit(r"g\s*/\s*[lL]\b", "g/L", UnitPlacement::Trailing),
        ];
        profile.vocabulary = vec![
            class("non-halophile", &[r"non-?halophil\w*"]),
            class("extreme halophile", &[r"extreme(?:ly)?\s+halophil\w*"]),
            class("halotolerant", &[r"halo-?toleran\w*", r"salt[- ]toleran\w*"]),
            class("halophile", &[r"halophil\w*"]),
        ];
        profile
    }

    /// Acidity; the `pH` marker precedes its value
    pub fn ph() -> Self {
        let mut profile = Self::base("ph");
        profile.notation = vec![rewrite(r"(?i)\bph([0-9]|\b)", "pH${1}")];
        profile.units = vec![unit(r"\bpH", "[pH]", UnitPlacement::Leading)];
        profile.vocabulary = vec![
            class("acidophile", &[r"acidophil\w*"]),
            class("acidotolerant", &[r"acid[- ]?toleran\w*"]),
            class("alkaliphile", &[r"alkal[io]phil\w*"]),
            class("alkalitolerant", &[r"alkali[- ]?toleran\w*"]),
            class("neutrophile", &[r"neutrophil\w*"]),
        ];
        profile
    }
}

/// Qualifier cues shared by every built-in profile.
///
/// "below X" reads as an upper bound, so it maps to `maximum`; "above X"
/// maps to `minimum`. Abbreviations need their dot: a bare "min" is
/// usually minutes.
pub fn default_cues() -> Vec<QualifierCue> {
    use QualifierLabel::{Maximum, Minimum, Optimum};

    [
        ("up to", Maximum),
        ("≤", Maximum),
        ("<", Maximum),
        ("below", Maximum),
        ("less than", Maximum),
        ("maximum", Maximum),
        ("maximal", Maximum),
        ("max.", Maximum),
        ("above", Minimum),
        ("≥", Minimum),
        (">", Minimum),
        ("over", Minimum),
        ("more than", Minimum),
        ("at least", Minimum),
        ("minimum", Minimum),
        ("minimal", Minimum),
        ("min.", Minimum),
        ("optimum", Optimum),
        ("optimal", Optimum),
        ("opt.", Optimum),
    ]
    .into_iter()
    .map(|(cue, qualifier)| QualifierCue {
        cue: cue.to_string(),
        qualifier,
    })
    .collect()
}

fn rewrite(pattern: &str, replacement: &str) -> NotationRewrite {
    NotationRewrite {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
    }
}

fn unit(pattern: &str, symbol: &str, placement: UnitPlacement) -> UnitMarker {
    UnitMarker {
        pattern: pattern.to_string(),
        symbol: symbol.to_string(),
        placement,
    }
}

fn class(label: &str, patterns: &[&str]) -> CategoryClass {
    CategoryClass {
        label: label.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
    }
}
