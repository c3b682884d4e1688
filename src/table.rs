//! Reference Table Types
//!
//! `RawTable` holds the methodology's wording verbatim, as assembled by the
//! generator. `NormalizedTable` is what `config.json` contains: canonical
//! keys, canonical labels, bare integer years and `null` for impossible
//! targets.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{PipelineError, Result};
use crate::vocabulary::{
    is_canonical_baseline, Field, Vocabulary, CONDITIONS, TRANSITION_SEPARATOR,
};

// ============================================================================
// RAW TABLE
// ============================================================================

/// Scoring constant block from `globals.json`
#[derive(Debug, Clone, PartialEq)]
pub enum RawGlobal {
    /// Verbose label → score
    Scores(BTreeMap<String, Number>),
    Scalar(Number),
}

/// One cell of a habitat entry, in source wording
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Label(String),
    /// Verbose column header → verbose cell text
    Grid(BTreeMap<String, String>),
}

pub type RawEntry = BTreeMap<Field, RawCell>;

/// Table assembled from the source specification, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub globals: BTreeMap<Field, RawGlobal>,
    /// Habitat name → fields
    pub habitats: BTreeMap<String, RawEntry>,
}

impl RawTable {
    /// JSON view keyed by the methodology's own headers
    pub fn to_json_value(&self) -> Value {
        let mut root = Map::new();

        for (field, global) in &self.globals {
            let value = match global {
                RawGlobal::Scalar(number) => Value::Number(number.clone()),
                RawGlobal::Scores(scores) => Value::Object(
                    scores
                        .iter()
                        .map(|(label, score)| (label.clone(), Value::Number(score.clone())))
                        .collect(),
                ),
            };
            root.insert(field.source_header().to_string(), value);
        }

        let habitats: Map<String, Value> = self
            .habitats
            .iter()
            .map(|(name, entry)| {
                let fields: Map<String, Value> = entry
                    .iter()
                    .map(|(field, cell)| {
                        let value = match cell {
                            RawCell::Label(label) => Value::String(label.clone()),
                            RawCell::Grid(grid) => Value::Object(
                                grid.iter()
                                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                                    .collect(),
                            ),
                        };
                        (field.source_header().to_string(), value)
                    })
                    .collect();
                (name.clone(), Value::Object(fields))
            })
            .collect();

        root.insert("habitats".to_string(), Value::Object(habitats));
        Value::Object(root)
    }
}

// ============================================================================
// NORMALIZED TABLE
// ============================================================================

/// Scoring constant block in `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Global {
    Scalar(Number),
    /// Canonical label → score
    Scores(BTreeMap<String, Number>),
}

/// One cell of a normalized habitat entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Target not possible
    Null,
    Label(String),
    /// Condition or transition → years (`None` when not possible)
    Grid(BTreeMap<String, Option<u32>>),
}

pub type Entry = BTreeMap<Field, Cell>;

/// Contents of `config.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    #[serde(flatten)]
    pub globals: BTreeMap<Field, Global>,
    pub habitats: BTreeMap<String, Entry>,
}

impl NormalizedTable {
    /// Load a previously written `config.json`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;

        serde_json::from_str(&contents).map_err(|source| PipelineError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn habitat(&self, name: &str) -> Option<&Entry> {
        self.habitats.get(name)
    }

    /// Label of a habitat's field; `None` for missing fields, nulls and grids
    pub fn label(&self, habitat: &str, field: Field) -> Option<&str> {
        match self.habitats.get(habitat)?.get(&field)? {
            Cell::Label(label) => Some(label),
            _ => None,
        }
    }

    /// Score attached to a canonical label in a globals block
    pub fn score(&self, field: Field, label: &str) -> Option<f64> {
        match self.globals.get(&field)? {
            Global::Scores(scores) => scores.get(label)?.as_f64(),
            Global::Scalar(_) => None,
        }
    }

    pub fn scalar(&self, field: Field) -> Option<f64> {
        match self.globals.get(&field)? {
            Global::Scalar(number) => number.as_f64(),
            Global::Scores(_) => None,
        }
    }

    /// Post-condition: no verbose wording survived normalization
    ///
    /// Every closed-vocabulary label, every grid key and every globals label
    /// must be canonical for its field.
    pub fn verify(&self) -> Result<()> {
        for (field, global) in &self.globals {
            if let Global::Scores(scores) = global {
                for label in scores.keys() {
                    ensure_canonical(*field, label, "globals")?;
                }
            }
        }

        for (name, entry) in &self.habitats {
            for (field, cell) in entry {
                match (field.vocabulary(), cell) {
                    (Vocabulary::Closed(_), Cell::Null)
                        if matches!(field, Field::CreationDifficulty | Field::EnhancementDifficulty) => {}
                    (Vocabulary::Closed(_) | Vocabulary::Open, Cell::Label(label)) => {
                        ensure_canonical(*field, label, name)?;
                    }
                    (Vocabulary::ConditionYears, Cell::Grid(grid)) => {
                        for key in grid.keys() {
                            if !CONDITIONS.contains(&key.as_str()) {
                                return Err(unnormalized(*field, name, key));
                            }
                        }
                    }
                    (Vocabulary::TransitionYears, Cell::Grid(grid)) => {
                        for key in grid.keys() {
                            if !is_canonical_transition(key) {
                                return Err(unnormalized(*field, name, key));
                            }
                        }
                    }
                    (_, other) => {
                        return Err(unnormalized(*field, name, &format!("{:?}", other)));
                    }
                }
            }
        }

        Ok(())
    }
}

fn ensure_canonical(field: Field, label: &str, location: &str) -> Result<()> {
    if field.is_canonical(label) {
        Ok(())
    } else {
        Err(unnormalized(field, location, label))
    }
}

fn unnormalized(field: Field, location: &str, label: &str) -> PipelineError {
    PipelineError::Unnormalized {
        field: field.key(),
        location: location.to_string(),
        label: label.to_string(),
    }
}

/// `<baseline> - <target>` with both sides canonical
pub fn is_canonical_transition(key: &str) -> bool {
    CONDITIONS.iter().any(|target| {
        key.strip_suffix(target)
            .and_then(|rest| rest.strip_suffix(TRANSITION_SEPARATOR))
            .is_some_and(is_canonical_baseline)
    })
}
