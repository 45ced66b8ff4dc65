//! envcond Extractor - Condition text parsing pipeline
//!
//! Turns one free-text condition value into an ordered list of
//! `ParseComponent`s. The pipeline is driven by an injected
//! [`FactorProfile`](profile::FactorProfile):
//!
//! 1. [`Normalizer`](normalize::Normalizer) canonicalizes the text
//! 2. [`NumericExtractor`](numeric::NumericExtractor) finds ranges, lists and spot values
//! 3. [`CategoricalClassifier`](categorical::CategoricalClassifier) is the keyword fallback
//! 4. [`ComponentAssembler`](assembler::ComponentAssembler) runs the strategies in order

use envcond_core::ParseComponent;

pub mod assembler;
pub mod categorical;
pub mod normalize;
pub mod numeric;
pub mod profile;

pub use assembler::{
    CategoricalStrategy, ComponentAssembler, NumericStrategy, WholeTextStrategy,
};
pub use categorical::{CategoricalClassifier, CategoricalMatch};
pub use normalize::Normalizer;
pub use numeric::{NumericExtraction, NumericExtractor};
pub use profile::FactorProfile;

/// A component together with the byte span of normalized text it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedComponent {
    pub component: ParseComponent,
    pub start: usize,
    pub end: usize,
}

impl SpannedComponent {
    pub fn new(component: ParseComponent, start: usize, end: usize) -> Self {
        Self {
            component,
            start,
            end,
        }
    }
}

/// One step of the precedence cascade
pub trait ParseStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Components for normalized text, or `None` when the strategy does not apply
    fn apply(&self, text: &str) -> Option<Vec<ParseComponent>>;
}

/// Non-empty slices of `text` not covered by the sorted, disjoint `spans`
pub(crate) fn fragments_outside<'t>(text: &'t str, spans: &[(usize, usize)]) -> Vec<&'t str> {
    let mut fragments = Vec::new();
    let mut cursor = 0;
    for &(start, end) in spans {
        if start > cursor {
            fragments.push(&text[cursor..start]);
        }
        cursor = cursor.max(end);
    }
    if cursor < text.len() {
        fragments.push(&text[cursor..]);
    }
    fragments
}
