//! Metric Vocabulary
//!
//! Field names as they appear in the Metric tool's tables, the short keys
//! written to `config.json`, and the canonical labels each field may hold
//! once normalized.
//!
//! Source: Biodiversity Metric 3.0 calculation tool (Natural England, JP039)

use serde::{Deserialize, Serialize};

/// A categorical or numeric field of the reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Habitat,
    BroadHabitat,
    Condition,
    Distinctiveness,
    StrategicSignificance,
    SpatialRisk,
    Difficulty,
    CreationDifficulty,
    EnhancementDifficulty,
    CreationTime,
    EnhancementTime,
    Depreciation,
}

/// How the values of a field are constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    /// Free text taken from the source (habitat names)
    Open,
    /// One of a fixed set of canonical labels
    Closed(&'static [&'static str]),
    /// Grid of key → years, where keys are target conditions
    ConditionYears,
    /// Grid of key → years, where keys are `<baseline> - <target>` transitions
    TransitionYears,
    /// A single bare number
    Number,
}

// ============================================================================
// CANONICAL LABELS
// ============================================================================

pub const CONDITIONS: &[&str] = &[
    "Good",
    "Fairly Good",
    "Moderate",
    "Fairly Poor",
    "Poor",
    "Agricultural",
    "Other",
];

/// Distinctiveness qualifier used as the baseline of enhancement transitions
pub const LOWER_DISTINCTIVENESS: &str = "Lower Distinctiveness Habitat";

pub const DISTINCTIVENESS_BANDS: &[&str] = &[
    "Very Low",
    "Low",
    "Medium",
    "High",
    "Very High",
    LOWER_DISTINCTIVENESS,
];

pub const SIGNIFICANCE_TIERS: &[&str] = &["High", "Medium", "Low"];

pub const SPATIAL_RISK_TIERS: &[&str] = &["Low", "Medium", "High"];

pub const DIFFICULTY_RATINGS: &[&str] = &["Very High", "High", "Medium", "Low"];

/// Separator between baseline and target in enhancement transition keys
pub const TRANSITION_SEPARATOR: &str = " - ";

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Habitat,
        Field::BroadHabitat,
        Field::Condition,
        Field::Distinctiveness,
        Field::StrategicSignificance,
        Field::SpatialRisk,
        Field::Difficulty,
        Field::CreationDifficulty,
        Field::EnhancementDifficulty,
        Field::CreationTime,
        Field::EnhancementTime,
        Field::Depreciation,
    ];

    /// Header as written in the methodology document
    pub const fn source_header(self) -> &'static str {
        match self {
            Field::Habitat => "Habitat Description",
            Field::BroadHabitat => "Broad Habitat",
            Field::Condition => "Condition",
            Field::Distinctiveness => "Distinctiveness",
            Field::StrategicSignificance => "Strategic Significance",
            Field::SpatialRisk => "Spatial Risk",
            Field::Difficulty => "Technical Difficulty",
            Field::CreationDifficulty => "Technical Difficulty Creation",
            Field::EnhancementDifficulty => "Technical Difficulty Enhancement",
            Field::CreationTime => "Creation Time",
            Field::EnhancementTime => "Enhancement Time",
            Field::Depreciation => "Discount Rate",
        }
    }

    /// Key written to `config.json`
    pub const fn key(self) -> &'static str {
        match self {
            Field::Habitat => "habitat",
            Field::BroadHabitat => "broad_habitat",
            Field::Condition => "condition",
            Field::Distinctiveness => "distinctiveness",
            Field::StrategicSignificance => "strategic_significance",
            Field::SpatialRisk => "spatial_risk",
            Field::Difficulty => "difficulty",
            Field::CreationDifficulty => "creation_difficulty",
            Field::EnhancementDifficulty => "enhancement_difficulty",
            Field::CreationTime => "creation_time",
            Field::EnhancementTime => "enhancement_time",
            Field::Depreciation => "depreciation",
        }
    }

    pub const fn vocabulary(self) -> Vocabulary {
        match self {
            Field::Habitat | Field::BroadHabitat => Vocabulary::Open,
            Field::Condition => Vocabulary::Closed(CONDITIONS),
            Field::Distinctiveness => Vocabulary::Closed(DISTINCTIVENESS_BANDS),
            Field::StrategicSignificance => Vocabulary::Closed(SIGNIFICANCE_TIERS),
            Field::SpatialRisk => Vocabulary::Closed(SPATIAL_RISK_TIERS),
            Field::Difficulty | Field::CreationDifficulty | Field::EnhancementDifficulty => {
                Vocabulary::Closed(DIFFICULTY_RATINGS)
            }
            Field::CreationTime => Vocabulary::ConditionYears,
            Field::EnhancementTime => Vocabulary::TransitionYears,
            Field::Depreciation => Vocabulary::Number,
        }
    }

    /// Exact, case-sensitive lookup of a verbose header
    pub fn from_source_header(header: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| field.source_header() == header)
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Whether `label` is already in canonical form for this field
    ///
    /// Open fields accept any non-empty text; grid and number fields have no
    /// label form and never match.
    pub fn is_canonical(self, label: &str) -> bool {
        match self.vocabulary() {
            Vocabulary::Open => !label.trim().is_empty(),
            Vocabulary::Closed(labels) => labels.contains(&label),
            _ => false,
        }
    }
}

/// Whether `label` is a canonical baseline of an enhancement transition
pub fn is_canonical_baseline(label: &str) -> bool {
    label == LOWER_DISTINCTIVENESS || CONDITIONS.contains(&label)
}
