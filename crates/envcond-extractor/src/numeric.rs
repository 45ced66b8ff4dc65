//! Numeric extraction
//!
//! Finds numeric content in normalized text with three rules applied in
//! strict priority: ranges, shared-unit lists, then qualified spot values.
//! Each rule masks the spans it accepts, so a lower-priority rule never
//! sees text a higher-priority rule already consumed. Whatever is left is
//! returned as residual fragments.

use regex::{Captures, Regex};
use tracing::trace;

use crate::profile::{FactorProfile, UnitPlacement};
use crate::{fragments_outside, SpannedComponent};
use envcond_core::{EnvcondError, ParseComponent, QualifierLabel, Result};

/// Numeric token: optional sign (only when not glued to a preceding word),
/// digits and an optional decimal part.
const NUM: &str = r"(?:\B-)?[0-9]+(?:\.[0-9]+)?";

/// Separator between list items: comma, "and", "or", or a comma followed by either
const LIST_SEP: &str = r"(?:\s*,\s*(?:(?:and|or)\s+)?|\s+(?:and|or)\s+)";

/// Separator between range bounds
const RANGE_SEP: &str = r"\s*(?:-|(?i:to))\s*";

/// Byte written over consumed spans
const MASK: &str = "\u{1}";

/// Result of numeric extraction over one text
#[derive(Debug, Clone, Default)]
pub struct NumericExtraction {
    /// Components ordered by span start
    pub components: Vec<SpannedComponent>,
    /// Text left over once all consumed spans are removed
    pub residual: Vec<String>,
}

impl NumericExtraction {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Patterns compiled for one unit marker
#[derive(Debug, Clone)]
struct UnitRules {
    symbol: String,
    ranges: Vec<Regex>,
    list: Regex,
    spot: Regex,
}

impl UnitRules {
    fn compile(profile: &str, unit: &str, symbol: &str, placement: UnitPlacement) -> Result<Self> {
        let u = format!("(?:{unit})");
        let (ranges, list, spot) = match placement {
            UnitPlacement::Trailing => (
                vec![
                    format!(r"(?P<a>{NUM})(?:\s*{u})?{RANGE_SEP}(?P<b>{NUM})\s*{u}"),
                    format!(r"(?i:between)\s+(?P<a>{NUM})(?:\s*{u})?\s+(?i:and)\s+(?P<b>{NUM})\s*{u}"),
                ],
                format!(r"(?P<items>{NUM}(?:{LIST_SEP}{NUM})+)\s*{u}"),
                format!(r"(?P<v>{NUM})\s*{u}"),
            ),
            UnitPlacement::Leading => (
                vec![
                    format!(r"{u}\s*(?P<a>{NUM}){RANGE_SEP}(?:{u}\s*)?(?P<b>{NUM})"),
                    format!(r"(?i:between)\s+{u}\s*(?P<a>{NUM})\s+(?i:and)\s+(?:{u}\s*)?(?P<b>{NUM})"),
                ],
                format!(r"{u}\s*(?P<items>{NUM}(?:{LIST_SEP}{NUM})+)"),
                format!(r"{u}\s*(?P<v>{NUM})"),
            ),
        };

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| EnvcondError::InvalidPattern {
                profile: profile.to_string(),
                message: e.to_string(),
            })
        };

        Ok(Self {
            symbol: symbol.to_string(),
            ranges: ranges
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>>>()?,
            list: compile(&list)?,
            spot: compile(&spot)?,
        })
    }
}

/// Rule-based numeric extractor
#[derive(Debug, Clone)]
pub struct NumericExtractor {
    units: Vec<UnitRules>,
    number: Regex,
    cues: Vec<(Regex, QualifierLabel)>,
    lookback_chars: usize,
}

/// A match awaiting acceptance
struct Candidate<'t> {
    start: usize,
    end: usize,
    unit: usize,
    caps: Captures<'t>,
}

impl NumericExtractor {
    /// Compile the extractor for a profile
    pub fn new(profile: &FactorProfile) -> Result<Self> {
        let units = profile
            .units
            .iter()
            .map(|u| UnitRules::compile(&profile.name, &u.pattern, &u.symbol, u.placement))
            .collect::<Result<Vec<_>>>()?;

        let cues = profile
            .cues
            .iter()
            .map(|cue| {
                Regex::new(&cue_pattern(&cue.cue))
                    .map(|re| (re, cue.qualifier))
                    .map_err(|e| EnvcondError::InvalidPattern {
                        profile: profile.name.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let number = Regex::new(NUM).map_err(|e| EnvcondError::InvalidPattern {
            profile: profile.name.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            units,
            number,
            cues,
            lookback_chars: profile.lookback_chars,
        })
    }

    /// Extract numeric components from normalized text
    pub fn extract(&self, text: &str) -> NumericExtraction {
        let mut masked = text.to_string();
        let mut consumed: Vec<(usize, usize)> = Vec::new();
        let mut components: Vec<SpannedComponent> = Vec::new();

        // 1. Ranges
        let candidates = self.candidates(&masked, |rules| rules.ranges.iter().collect());
        for candidate in candidates {
            if overlaps(&consumed, candidate.start, candidate.end) {
                continue;
            }
            let (Some(a), Some(b)) = (
                parse_capture(&candidate.caps, "a"),
                parse_capture(&candidate.caps, "b"),
            ) else {
                continue;
            };
            let symbol = &self.units[candidate.unit].symbol;
            trace!(start = candidate.start, end = candidate.end, "range");
            components.push(SpannedComponent::new(
                ParseComponent::range(&text[candidate.start..candidate.end], a, b, symbol),
                candidate.start,
                candidate.end,
            ));
            consumed.push((candidate.start, candidate.end));
        }
        mask(&mut masked, &consumed);

        // 2. Shared-unit lists
        let candidates = self.candidates(&masked, |rules| vec![&rules.list]);
        for candidate in candidates {
            if overlaps(&consumed, candidate.start, candidate.end) {
                continue;
            }
            let symbol = &self.units[candidate.unit].symbol;
            let Some(items) = candidate.caps.name("items") else {
                continue;
            };
            let tokens: Vec<_> = self
                .number
                .find_iter(items.as_str())
                .filter_map(|m| finite(m.as_str()).map(|v| (m, v)))
                .collect();
            if tokens.len() < 2 {
                continue;
            }
            trace!(start = candidate.start, items = tokens.len(), "list");
            for (m, value) in tokens {
                components.push(SpannedComponent::new(
                    ParseComponent::spot(m.as_str(), value, symbol),
                    items.start() + m.start(),
                    items.start() + m.end(),
                ));
            }
            consumed.push((candidate.start, candidate.end));
        }
        mask(&mut masked, &consumed);

        // 3. Qualified spot values
        let candidates = self.candidates(&masked, |rules| vec![&rules.spot]);
        for candidate in candidates {
            if overlaps(&consumed, candidate.start, candidate.end) {
                continue;
            }
            let Some(value) = parse_capture(&candidate.caps, "v") else {
                continue;
            };
            let symbol = &self.units[candidate.unit].symbol;
            let (start, qualifier) = match self.find_cue(text, candidate.start, &consumed) {
                Some((cue_start, qualifier)) => (cue_start, Some(qualifier)),
                None => (candidate.start, None),
            };
            let mut component = ParseComponent::spot(&text[start..candidate.end], value, symbol);
            if let Some(qualifier) = qualifier {
                component = component.with_qualifier(qualifier);
            }
            trace!(start, end = candidate.end, ?qualifier, "spot");
            components.push(SpannedComponent::new(component, start, candidate.end));
            consumed.push((start, candidate.end));
        }

        components.sort_by_key(|c| c.start);
        consumed.sort_unstable();

        NumericExtraction {
            components,
            residual: fragments_outside(text, &consumed)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Collect matches of one rule across all unit markers, ordered by start
    /// then by length (longest first), then by unit order.
    fn candidates<'t, F>(&self, masked: &'t str, select: F) -> Vec<Candidate<'t>>
    where
        F: Fn(&UnitRules) -> Vec<&Regex>,
    {
        let mut candidates = Vec::new();
        for (unit, rules) in self.units.iter().enumerate() {
            for regex in select(rules) {
                for caps in regex.captures_iter(masked) {
                    if let Some(whole) = caps.get(0) {
                        candidates.push(Candidate {
                            start: whole.start(),
                            end: whole.end(),
                            unit,
                            caps,
                        });
                    }
                }
            }
        }
        candidates.sort_by(|x, y| {
            x.start
                .cmp(&y.start)
                .then((y.end - y.start).cmp(&(x.end - x.start)))
                .then(x.unit.cmp(&y.unit))
        });
        candidates
    }

    /// Look back from `start` for a qualifier cue.
    ///
    /// The window covers at most `lookback_chars` characters and never
    /// reaches into an earlier consumed span. The cue ending closest to the
    /// value wins; ties go to cue-table order. Returns the cue start offset.
    fn find_cue(
        &self,
        text: &str,
        start: usize,
        consumed: &[(usize, usize)],
    ) -> Option<(usize, QualifierLabel)> {
        let floor = consumed
            .iter()
            .filter(|(_, end)| *end <= start)
            .map(|(_, end)| *end)
            .max()
            .unwrap_or(0);
        let window_start = lookback_start(text, start, self.lookback_chars).max(floor);
        let window = &text[window_start..start];

        let mut best: Option<(usize, usize, QualifierLabel)> = None;
        for (regex, qualifier) in &self.cues {
            if let Some(m) = regex.find_iter(window).last() {
                if best.map_or(true, |(_, end, _)| m.end() > end) {
                    best = Some((m.start(), m.end(), *qualifier));
                }
            }
        }

        best.map(|(cue_start, _, qualifier)| (window_start + cue_start, qualifier))
    }
}

/// Case-insensitive cue regex with word boundaries on alphabetic edges
fn cue_pattern(cue: &str) -> String {
    let starts_word = cue.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = cue.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "(?i){}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(cue),
        if ends_word { r"\b" } else { "" },
    )
}

/// Byte offset `chars` characters before `start`
fn lookback_start(text: &str, start: usize, chars: usize) -> usize {
    if chars == 0 {
        return start;
    }
    text[..start]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn parse_capture(caps: &Captures<'_>, name: &str) -> Option<f64> {
    caps.name(name).and_then(|m| finite(m.as_str()))
}

fn finite(number: &str) -> Option<f64> {
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn overlaps(consumed: &[(usize, usize)], start: usize, end: usize) -> bool {
    consumed.iter().any(|&(s, e)| start < e && s < end)
}

/// Overwrite consumed spans with a byte no rule can match
fn mask(masked: &mut String, consumed: &[(usize, usize)]) {
    for &(start, end) in consumed {
        masked.replace_range(start..end, &MASK.repeat(end - start));
    }
}
