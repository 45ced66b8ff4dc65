//! Categorical classification
//!
//! Keyword fallback for descriptive phenotype terms ("thermophilic",
//! "halotolerant"). The vocabulary is an ordered priority list: the first
//! class with any match wins, so overlapping classes resolve the same way
//! every run.

use regex::Regex;

use crate::fragments_outside;
use crate::profile::FactorProfile;
use envcond_core::{EnvcondError, Result};

/// Outcome of a successful classification
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalMatch {
    /// Label of the winning class
    pub label: String,
    /// Surface text of the first match
    pub matched_text: String,
    /// Byte spans of every match of the winning class
    pub spans: Vec<(usize, usize)>,
    /// Text left once matched spans are removed
    pub residual: Vec<String>,
}

/// Ordered keyword matcher over a profile's vocabulary
#[derive(Debug, Clone)]
pub struct CategoricalClassifier {
    classes: Vec<(String, Regex)>,
}

impl CategoricalClassifier {
    /// Compile the classifier for a profile
    pub fn new(profile: &FactorProfile) -> Result<Self> {
        let classes = profile
            .vocabulary
            .iter()
            .filter(|class| !class.patterns.is_empty())
            .map(|class| {
                let pattern = format!(r"(?i)\b(?:{})", class.patterns.join("|"));
                Regex::new(&pattern)
                    .map(|re| (class.label.clone(), re))
                    .map_err(|e| EnvcondError::InvalidPattern {
                        profile: profile.name.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { classes })
    }

    /// Classify normalized text; at most one label is returned
    pub fn classify(&self, text: &str) -> Option<CategoricalMatch> {
        self.classes.iter().find_map(|(label, regex)| {
            let spans: Vec<(usize, usize)> =
                regex.find_iter(text).map(|m| (m.start(), m.end())).collect();
            let &(first_start, first_end) = spans.first()?;

            Some(CategoricalMatch {
                label: label.clone(),
                matched_text: text[first_start..first_end].to_string(),
                residual: fragments_outside(text, &spans)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                spans,
            })
        })
    }
}
