//! Text normalization
//!
//! Canonicalizes dash variants, unusual whitespace, invisible format
//! characters and unit notation so the extractors only ever see one
//! spelling of each.

use std::collections::HashSet;

use regex::Regex;

use crate::profile::FactorProfile;
use envcond_core::{EnvcondError, Result};

/// Profile-driven text normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    dashes: HashSet<char>,
    spaces: HashSet<char>,
    format_chars: HashSet<char>,
    notation: Vec<(Regex, String)>,
}

impl Normalizer {
    /// Compile the normalizer for a profile
    pub fn new(profile: &FactorProfile) -> Result<Self> {
        let notation = profile
            .notation
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.replacement.clone()))
                    .map_err(|e| EnvcondError::InvalidPattern {
                        profile: profile.name.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dashes: profile.dashes.iter().copied().collect(),
            spaces: profile.spaces.iter().copied().collect(),
            format_chars: profile.format_chars.iter().copied().collect(),
            notation,
        })
    }

    /// Normalize one text value. Never fails; unknown characters pass through.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if self.format_chars.contains(&c) {
                continue;
            }
            if self.dashes.contains(&c) {
                out.push('-');
            } else if self.spaces.contains(&c) {
                out.push(' ');
            } else {
                out.push(c);
            }
        }

        for (regex, replacement) in &self.notation {
            if regex.is_match(&out) {
                out = regex.replace_all(&out, replacement.as_str()).into_owned();
            }
        }

        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
