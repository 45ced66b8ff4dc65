//! Component assembly
//!
//! Runs the precedence cascade for one text value: numeric strategy,
//! categorical strategy, then the whole-text fallback. The first strategy
//! returning a non-empty list decides the result.

use tracing::debug;

use crate::categorical::CategoricalClassifier;
use crate::normalize::Normalizer;
use crate::numeric::NumericExtractor;
use crate::profile::FactorProfile;
use crate::ParseStrategy;
use envcond_core::{NoMatchPolicy, ParseComponent, ParseConfig, Result};

/// Connective words that never make a residual fragment meaningful on their own.
/// Hedges such as "ca." or "about" are content and stay out of this list.
const RESIDUAL_STOPWORDS: &[&str] = &[
    "a", "an", "and", "or", "to", "at", "of", "in", "on", "with", "the", "is", "was", "for",
    "from", "by",
];

/// Clean leftover fragments into a single unparsed component, if any content remains
pub fn residual_component<S: AsRef<str>>(fragments: &[S]) -> Option<ParseComponent> {
    let kept: Vec<&str> = fragments
        .iter()
        .map(|f| f.as_ref().trim_matches(|c: char| c.is_whitespace() || is_punctuation(c)))
        .filter(|f| is_meaningful(f))
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(ParseComponent::unparsed(kept.join(" ")))
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '\u{1}' | '…' | '·' | '•')
}

fn is_meaningful(fragment: &str) -> bool {
    fragment
        .split_whitespace()
        .map(|word| word.trim_matches(is_punctuation).to_lowercase())
        .any(|word| {
            word.chars().any(char::is_alphanumeric) && !RESIDUAL_STOPWORDS.contains(&word.as_str())
        })
}

// ============================================================================
// Strategies
// ============================================================================

/// Ranges, lists and spot values, plus any meaningful residual
pub struct NumericStrategy {
    extractor: NumericExtractor,
}

impl NumericStrategy {
    pub fn new(extractor: NumericExtractor) -> Self {
        Self { extractor }
    }
}

impl ParseStrategy for NumericStrategy {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn apply(&self, text: &str) -> Option<Vec<ParseComponent>> {
        let extraction = self.extractor.extract(text);
        if extraction.is_empty() {
            return None;
        }

        let mut components: Vec<ParseComponent> = extraction
            .components
            .into_iter()
            .map(|spanned| spanned.component)
            .collect();
        components.extend(residual_component(&extraction.residual));
        Some(components)
    }
}

/// Keyword fallback, plus any meaningful residual
pub struct CategoricalStrategy {
    classifier: CategoricalClassifier,
}

impl CategoricalStrategy {
    pub fn new(classifier: CategoricalClassifier) -> Self {
        Self { classifier }
    }
}

impl ParseStrategy for CategoricalStrategy {
    fn name(&self) -> &'static str {
        "categorical"
    }

    fn apply(&self, text: &str) -> Option<Vec<ParseComponent>> {
        let found = self.classifier.classify(text)?;

        let mut components = vec![ParseComponent::categorical(found.matched_text, found.label)];
        components.extend(residual_component(&found.residual));
        Some(components)
    }
}

/// Last resort: the whole text as one unparsed component
pub struct WholeTextStrategy {
    policy: NoMatchPolicy,
}

impl WholeTextStrategy {
    pub fn new(policy: NoMatchPolicy) -> Self {
        Self { policy }
    }
}

impl ParseStrategy for WholeTextStrategy {
    fn name(&self) -> &'static str {
        "whole_text"
    }

    fn apply(&self, text: &str) -> Option<Vec<ParseComponent>> {
        match self.policy {
            NoMatchPolicy::WholeText if !text.is_empty() => {
                Some(vec![ParseComponent::unparsed(text)])
            }
            _ => None,
        }
    }
}

// ============================================================================
// Assembler
// ============================================================================

/// Normalizes text and runs the strategy cascade
pub struct ComponentAssembler {
    normalizer: Normalizer,
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl ComponentAssembler {
    /// Standard cascade for a profile
    pub fn new(profile: &FactorProfile, no_match: NoMatchPolicy) -> Result<Self> {
        Ok(Self::from_strategies(
            Normalizer::new(profile)?,
            vec![
                Box::new(NumericStrategy::new(NumericExtractor::new(profile)?)),
                Box::new(CategoricalStrategy::new(CategoricalClassifier::new(profile)?)),
                Box::new(WholeTextStrategy::new(no_match)),
            ],
        ))
    }

    /// Standard cascade for the built-in profile named in the config
    pub fn from_config(config: &ParseConfig) -> Result<Self> {
        let profile = FactorProfile::for_factor(config.factor).with_lookback(config.lookback_chars);
        Self::new(&profile, config.no_match)
    }

    /// Custom cascade; strategies run in the order given
    pub fn from_strategies(normalizer: Normalizer, strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self {
            normalizer,
            strategies,
        }
    }

    /// Parse one raw text value into its components
    pub fn assemble(&self, raw_text: &str) -> Vec<ParseComponent> {
        let normalized = self.normalizer.normalize(raw_text);

        for strategy in &self.strategies {
            if let Some(components) = strategy.apply(&normalized) {
                if !components.is_empty() {
                    debug!(
                        strategy = strategy.name(),
                        components = components.len(),
                        text = %normalized,
                        "assembled"
                    );
                    return components;
                }
            }
        }

        debug!(text = %normalized, "no components");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envcond_core::{Factor, QualifierLabel};

    fn assembler() -> ComponentAssembler {
        ComponentAssembler::new(&FactorProfile::temperature(), NoMatchPolicy::WholeText).unwrap()
    }

    #[test]
    fn test_example_range() {
        assert_eq!(
            assembler().assemble("20-30°C"),
            vec![ParseComponent::range("20-30°C", 20.0, 30.0, "Cel")]
        );
    }

    #[test]
    fn test_example_qualified_spot() {
        assert_eq!(
            assembler().assemble("above 45°C"),
            vec![ParseComponent::spot("above 45°C", 45.0, "Cel").with_qualifier(QualifierLabel::Minimum)]
        );
    }

    #[test]
    fn test_example_list() {
        let components = assembler().assemble("25, 30, and 35°C");
        assert_eq!(components.len(), 3);
        let values: Vec<_> = components.iter().filter_map(|c| c.spot_value()).collect();
        assert_eq!(values, vec![25.0, 30.0, 35.0]);
        assert!(components.iter().all(|c| c.unit() == Some("Cel")));
        assert!(components.iter().all(|c| c.qualifier_label().is_none()));
    }

    #[test]
    fn test_example_categorical() {
        assert_eq!(
            assembler().assemble("thermophilic"),
            vec![ParseComponent::categorical("thermophilic", "thermophile")]
        );
    }

    #[test]
    fn test_example_whole_text_fallback() {
        assert_eq!(
            assembler().assemble("moderately salty environment"),
            vec![ParseComponent::unparsed("moderately salty environment")]
        );
    }

    #[test]
    fn test_fallback_uses_normalized_text() {
        assert_eq!(
            assembler().assemble("  unknown\u{00A0}condition "),
            vec![ParseComponent::unparsed("unknown condition")]
        );
    }

    #[test]
    fn test_permissive_policy_yields_nothing() {
        let assembler =
            ComponentAssembler::new(&FactorProfile::temperature(), NoMatchPolicy::Empty).unwrap();
        assert!(assembler.assemble("unknown condition").is_empty());
        // Matches are unaffected by the policy
        assert_eq!(assembler.assemble("37°C").len(), 1);
    }

    #[test]
    fn test_numeric_wins_over_categorical() {
        let components = assembler().assemble("thermophilic, 45-70°C");
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].minimum_value(), Some(45.0));
        assert_eq!(components[1].unparsed_text(), Some("thermophilic"));
        assert!(components.iter().all(|c| c.categorical_label().is_none()));
    }

    #[test]
    fn test_numeric_residual_is_kept() {
        let components = assembler().assemble("growth at 20-30°C (pH 7)");
        assert_eq!(components.len(), 2);
        assert_eq!(components[1].unparsed_text(), Some("growth at pH 7"));
    }

    #[test]
    fn test_connective_residual_is_dropped() {
        let components = assembler().assemble("20-30°C and 45°C");
        assert_eq!(components.len(), 2);
        assert!(components.iter().all(|c| c.is_numeric()));
    }

    #[test]
    fn test_hedge_residual_is_kept() {
        assert_eq!(
            assembler().assemble("ca. 37°C"),
            vec![
                ParseComponent::spot("37°C", 37.0, "Cel"),
                ParseComponent::unparsed("ca"),
            ]
        );
        let components = assembler().assemble("about 20-30°C, respectively");
        assert_eq!(components[1].unparsed_text(), Some("about respectively"));
    }

    #[test]
    fn test_categorical_residual_is_separate_component() {
        let components = assembler().assemble("moderately thermophilic");
        assert_eq!(
            components,
            vec![
                ParseComponent::categorical("thermophilic", "thermophile"),
                ParseComponent::unparsed("moderately"),
            ]
        );
    }

    #[test]
    fn test_from_config() {
        let config = ParseConfig {
            factor: Factor::Ph,
            ..Default::default()
        };
        let assembler = ComponentAssembler::from_config(&config).unwrap();
        let components = assembler.assemble("pH 5.5 to 8.0");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].unit(), Some("[pH]"));
    }

    #[test]
    fn test_custom_strategy_order() {
        let profile = FactorProfile::temperature();
        let assembler = ComponentAssembler::from_strategies(
            Normalizer::new(&profile).unwrap(),
            vec![Box::new(WholeTextStrategy::new(NoMatchPolicy::WholeText))],
        );
        assert_eq!(
            assembler.assemble("20-30°C"),
            vec![ParseComponent::unparsed("20-30°C")]
        );
    }

    #[test]
    fn test_residual_component() {
        assert_eq!(residual_component(&[" , ", " and "]), None);
        assert_eq!(
            residual_component(&["growth at ", " in broth"]),
            Some(ParseComponent::unparsed("growth at in broth"))
        );
    }
}
