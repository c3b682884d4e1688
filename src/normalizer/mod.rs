//! Label Normalizer
//!
//! Applies the ordered rule list to every label of a [`RawTable`] and
//! produces the [`NormalizedTable`] written to `config.json`. Values are
//! passed through or replaced, never computed.

pub mod rules;

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::table::{Cell, Entry, Global, NormalizedTable, RawCell, RawGlobal, RawTable};
use crate::vocabulary::{Field, TRANSITION_SEPARATOR};

pub use rules::{Action, Rewrite, RewriteRule, RuleClass, RuleSet, Slot, Term, STANDARD_RULES};

/// Match counts per rule, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationReport {
    pub counts: Vec<(&'static str, usize)>,
}

impl NormalizationReport {
    pub fn count(&self, rule: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| *name == rule)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    /// Rules that matched nothing (allowed: not every export has sentinels)
    pub fn unmatched(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.counts
            .iter()
            .filter(|(_, count)| *count == 0)
            .map(|(name, _)| *name)
    }
}

/// Normalize a raw table and check the result for leftover verbose labels
pub fn normalize(raw: &RawTable, rules: &RuleSet) -> Result<(NormalizedTable, NormalizationReport)> {
    let mut normalizer = Normalizer::new(rules);
    let table = normalizer.table(raw)?;
    let report = normalizer.report();

    for (name, count) in &report.counts {
        debug!("Rule {}: {} matches", name, count);
    }
    for name in report.unmatched() {
        debug!("Rule {} matched nothing", name);
    }

    table.verify()?;

    info!(
        "Normalized {} globals and {} habitats ({} rewrites)",
        table.globals.len(),
        table.habitats.len(),
        report.total()
    );

    Ok((table, report))
}

struct Normalizer<'a> {
    rules: &'a RuleSet,
    counts: Vec<usize>,
}

impl<'a> Normalizer<'a> {
    fn new(rules: &'a RuleSet) -> Self {
        Normalizer {
            rules,
            counts: vec![0; rules.rules().len()],
        }
    }

    fn report(&self) -> NormalizationReport {
        NormalizationReport {
            counts: self
                .rules
                .rules()
                .iter()
                .zip(&self.counts)
                .map(|(rule, count)| (rule.name, *count))
                .collect(),
        }
    }

    fn rewrite(&mut self, slot: Slot, text: &str) -> Term {
        let rewrite = self.rules.rewrite(slot, text);
        self.record(&rewrite);
        rewrite.term
    }

    fn record(&mut self, rewrite: &Rewrite) {
        for &position in &rewrite.matched {
            self.counts[position] += 1;
        }
    }

    fn table(&mut self, raw: &RawTable) -> Result<NormalizedTable> {
        let mut table = NormalizedTable::default();

        for (field, global) in &raw.globals {
            table.globals.insert(*field, self.global(*field, global)?);
        }

        for (name, raw_entry) in &raw.habitats {
            let mut entry = Entry::new();
            for (field, cell) in raw_entry {
                entry.insert(*field, self.cell(name, *field, cell)?);
            }
            table.habitats.insert(name.clone(), entry);
        }

        Ok(table)
    }

    fn global(&mut self, field: Field, global: &RawGlobal) -> Result<Global> {
        let scores = match global {
            RawGlobal::Scalar(number) => return Ok(Global::Scalar(number.clone())),
            RawGlobal::Scores(scores) => scores,
        };

        let mut normalized = BTreeMap::new();
        let mut sources: BTreeMap<String, &str> = BTreeMap::new();

        for (label, score) in scores {
            let canonical = match self.rewrite(Slot::Label(field), label) {
                Term::Text(text) => text,
                other => return Err(unexpected(field, "globals", label, &other)),
            };
            insert_unique(&mut sources, field, &canonical, label)?;
            normalized.insert(canonical, score.clone());
        }

        Ok(Global::Scores(normalized))
    }

    fn cell(&mut self, habitat: &str, field: Field, cell: &RawCell) -> Result<Cell> {
        match cell {
            RawCell::Label(label) => match self.rewrite(Slot::Label(field), label) {
                Term::Text(text) => Ok(Cell::Label(text)),
                Term::Null => Ok(Cell::Null),
                other => Err(unexpected(field, habitat, label, &other)),
            },
            RawCell::Grid(grid) => {
                let mut normalized = BTreeMap::new();
                let mut sources: BTreeMap<String, &str> = BTreeMap::new();

                for (key, value) in grid {
                    let canonical_key = self.grid_key(habitat, field, key)?;
                    let years = match self.rewrite(Slot::Years, value) {
                        Term::Years(years) => Some(years),
                        Term::Null => None,
                        other => return Err(unexpected(field, habitat, value, &other)),
                    };
                    insert_unique(&mut sources, field, &canonical_key, key)?;
                    normalized.insert(canonical_key, years);
                }

                Ok(Cell::Grid(normalized))
            }
        }
    }

    fn grid_key(&mut self, habitat: &str, field: Field, key: &str) -> Result<String> {
        if field == Field::EnhancementTime {
            let (baseline, target) = self
                .rules
                .rewrite_transition(key)
                .ok_or_else(|| unnormalized(field, habitat, key))?;
            self.record(&baseline);
            self.record(&target);

            return match (baseline.term, target.term) {
                (Term::Text(baseline), Term::Text(target)) => {
                    Ok(format!("{}{}{}", baseline, TRANSITION_SEPARATOR, target))
                }
                _ => Err(unnormalized(field, habitat, key)),
            };
        }

        match self.rewrite(Slot::Label(Field::Condition), key) {
            Term::Text(text) => Ok(text),
            other => Err(unexpected(field, habitat, key, &other)),
        }
    }
}

/// Fail when two source labels of one map collapse onto the same key
fn insert_unique<'s>(
    sources: &mut BTreeMap<String, &'s str>,
    field: Field,
    canonical: &str,
    source: &'s str,
) -> Result<()> {
    if let Some(first) = sources.insert(canonical.to_string(), source) {
        return Err(PipelineError::Collision {
            field: field.key(),
            first: first.to_string(),
            second: source.to_string(),
            canonical: canonical.to_string(),
        });
    }
    Ok(())
}

fn unnormalized(field: Field, location: &str, label: &str) -> PipelineError {
    PipelineError::Unnormalized {
        field: field.key(),
        location: location.to_string(),
        label: label.to_string(),
    }
}

fn unexpected(field: Field, location: &str, label: &str, term: &Term) -> PipelineError {
    debug!("{} '{}' rewrote to {:?}", field.key(), label, term);
    unnormalized(field, location, label)
}
