//! Table Generator
//!
//! Assembles the [`RawTable`] from a [`SourceSpec`], keeping the
//! methodology's wording verbatim. Validation is the generator's only job
//! beyond assembly: required files, columns and globals must be present,
//! every export must list the same habitats, and every label must be one
//! the rule set knows how to normalize. No values are interpreted here.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, info};

use crate::data::{SourceSpec, SourceTable, GLOBALS_FILE};
use crate::error::{PipelineError, Result};
use crate::normalizer::{RuleSet, Slot};
use crate::table::{RawCell, RawEntry, RawGlobal, RawTable};
use crate::utils::split_description;
use crate::vocabulary::{Field, Vocabulary};

/// Number of habitats in Biodiversity Metric 3.0
pub const METRIC_HABITAT_COUNT: usize = 128;

/// Globals that `globals.json` must define
pub const REQUIRED_GLOBALS: [Field; 6] = [
    Field::Distinctiveness,
    Field::Condition,
    Field::StrategicSignificance,
    Field::SpatialRisk,
    Field::Difficulty,
    Field::Depreciation,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Abort unless exactly this many habitats are exported
    pub expected_habitats: Option<usize>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            expected_habitats: Some(METRIC_HABITAT_COUNT),
        }
    }
}

/// Build the raw table, failing on the first specification error
pub fn generate(spec: &SourceSpec, rules: &RuleSet, options: &GeneratorOptions) -> Result<RawTable> {
    let globals = generate_globals(spec, rules)?;

    let distinctiveness = label_column(&spec.distinctiveness, Field::Distinctiveness, rules)?;
    let creation_difficulty =
        label_column(&spec.creation_difficulty, Field::CreationDifficulty, rules)?;
    let enhancement_difficulty =
        label_column(&spec.enhancement_difficulty, Field::EnhancementDifficulty, rules)?;
    let creation_time = grid_columns(&spec.creation_time, Field::CreationTime, rules)?;
    let enhancement_time = grid_columns(&spec.enhancement_time, Field::EnhancementTime, rules)?;

    // Distinctiveness export defines the habitat list
    let habitats: BTreeSet<&String> = distinctiveness.keys().collect();

    if let Some(expected) = options.expected_habitats {
        if habitats.len() != expected {
            return Err(PipelineError::specification(
                spec.distinctiveness.origin(),
                format!("expected {} habitats, found {}", expected, habitats.len()),
            ));
        }
    }

    same_habitats(&habitats, &creation_difficulty, &spec.creation_difficulty)?;
    same_habitats(&habitats, &enhancement_difficulty, &spec.enhancement_difficulty)?;
    same_habitats(&habitats, &creation_time, &spec.creation_time)?;
    same_habitats(&habitats, &enhancement_time, &spec.enhancement_time)?;

    let mut entries = BTreeMap::new();
    for (name, described) in &distinctiveness {
        let mut entry = RawEntry::new();
        entry.insert(Field::Habitat, RawCell::Label(name.clone()));
        entry.insert(Field::BroadHabitat, RawCell::Label(described.broad.clone()));
        entry.insert(Field::Distinctiveness, RawCell::Label(described.value.clone()));
        insert_cell(&mut entry, Field::CreationDifficulty, &creation_difficulty, name, RawCell::Label);
        insert_cell(&mut entry, Field::EnhancementDifficulty, &enhancement_difficulty, name, RawCell::Label);
        insert_cell(&mut entry, Field::CreationTime, &creation_time, name, RawCell::Grid);
        insert_cell(&mut entry, Field::EnhancementTime, &enhancement_time, name, RawCell::Grid);
        entries.insert(name.clone(), entry);
    }

    info!(
        "Generated raw table: {} globals, {} habitats",
        globals.len(),
        entries.len()
    );

    Ok(RawTable {
        globals,
        habitats: entries,
    })
}

/// A value taken from one habitat row
struct Described<T> {
    broad: String,
    value: T,
}

fn insert_cell<T: Clone>(
    entry: &mut RawEntry,
    field: Field,
    column: &BTreeMap<String, Described<T>>,
    name: &str,
    wrap: fn(T) -> RawCell,
) {
    // Presence is checked by same_habitats
    if let Some(described) = column.get(name) {
        entry.insert(field, wrap(described.value.clone()));
    }
}

fn generate_globals(spec: &SourceSpec, rules: &RuleSet) -> Result<BTreeMap<Field, RawGlobal>> {
    let origin = GLOBALS_FILE;
    let mut globals = BTreeMap::new();

    for (header, value) in &spec.globals {
        let field = Field::from_source_header(header).ok_or_else(|| {
            PipelineError::specification(origin, format!("unknown field '{}'", header))
        })?;

        let global = match (field.vocabulary(), value) {
            (Vocabulary::Number, Value::Number(number)) => RawGlobal::Scalar(number.clone()),
            (Vocabulary::Closed(_), Value::Object(scores)) => {
                let mut parsed = BTreeMap::new();
                for (label, score) in scores {
                    if !rules.recognizes(Slot::Label(field), label) {
                        return Err(unrecognized(origin, field, label));
                    }
                    let Value::Number(score) = score else {
                        return Err(PipelineError::specification(
                            origin,
                            format!("score for '{}' in '{}' is not a number", label, header),
                        ));
                    };
                    parsed.insert(label.clone(), score.clone());
                }
                RawGlobal::Scores(parsed)
            }
            _ => {
                return Err(PipelineError::specification(
                    origin,
                    format!("field '{}' has an unexpected shape", header),
                ))
            }
        };

        globals.insert(field, global);
    }

    for field in REQUIRED_GLOBALS {
        if !globals.contains_key(&field) {
            return Err(PipelineError::specification(
                origin,
                format!("missing required field '{}'", field.source_header()),
            ));
        }
    }

    debug!("Globals: {:?}", globals.keys().collect::<Vec<_>>());
    Ok(globals)
}

/// Habitat name → label from a two-column export
fn label_column(
    table: &SourceTable,
    field: Field,
    rules: &RuleSet,
) -> Result<BTreeMap<String, Described<String>>> {
    let key = table.key_index()?;
    let column = table.column_index(field.source_header()).ok_or_else(|| {
        PipelineError::specification(
            table.origin(),
            format!("missing required column '{}'", field.source_header()),
        )
    })?;

    collect_rows(table, key, |row| {
        let label = cell(table, row, column, field.source_header())?;
        if !rules.recognizes(Slot::Label(field), label) {
            return Err(unrecognized(&table.origin(), field, label));
        }
        Ok(label.to_string())
    })
}

/// Habitat name → (column header → cell) from a wide export
fn grid_columns(
    table: &SourceTable,
    field: Field,
    rules: &RuleSet,
) -> Result<BTreeMap<String, Described<BTreeMap<String, String>>>> {
    let key = table.key_index()?;
    let columns: Vec<(usize, &String)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != key)
        .collect();

    if columns.is_empty() {
        return Err(PipelineError::specification(
            table.origin(),
            "no condition columns".to_string(),
        ));
    }

    for (_, header) in &columns {
        let known = match field {
            Field::EnhancementTime => rules.rewrite_transition(header).is_some(),
            _ => rules.recognizes(Slot::Label(Field::Condition), header),
        };
        if !known {
            return Err(unrecognized(&table.origin(), field, header));
        }
    }

    collect_rows(table, key, |row| {
        let mut grid = BTreeMap::new();
        for (idx, header) in &columns {
            let value = cell(table, row, *idx, header)?;
            if !rules.recognizes(Slot::Years, value) {
                return Err(unrecognized(&table.origin(), field, value));
            }
            grid.insert((*header).clone(), value.to_string());
        }
        Ok(grid)
    })
}

/// Key every row by habitat name, rejecting malformed and duplicate names
fn collect_rows<T>(
    table: &SourceTable,
    key: usize,
    mut parse: impl FnMut(&[Option<String>]) -> Result<T>,
) -> Result<BTreeMap<String, Described<T>>> {
    let mut rows = BTreeMap::new();

    for row in &table.rows {
        let description = cell(table, row, key, Field::Habitat.source_header())?;
        let (broad, name) = split_description(description).ok_or_else(|| {
            PipelineError::specification(
                table.origin(),
                format!("'{}' is not '<Broad habitat> - <Habitat name>'", description),
            )
        })?;

        let described = Described {
            broad: broad.to_string(),
            value: parse(row)?,
        };

        if rows.insert(name.to_string(), described).is_some() {
            return Err(PipelineError::specification(
                table.origin(),
                format!("duplicate habitat '{}'", name),
            ));
        }
    }

    Ok(rows)
}

fn cell<'r>(table: &SourceTable, row: &'r [Option<String>], idx: usize, header: &str) -> Result<&'r str> {
    row.get(idx).and_then(|v| v.as_deref()).ok_or_else(|| {
        PipelineError::specification(table.origin(), format!("empty '{}' cell", header))
    })
}

fn same_habitats<T>(
    expected: &BTreeSet<&String>,
    found: &BTreeMap<String, Described<T>>,
    table: &SourceTable,
) -> Result<()> {
    if let Some(missing) = expected.iter().find(|name| !found.contains_key(name.as_str())) {
        return Err(PipelineError::specification(
            table.origin(),
            format!("missing habitat '{}'", missing),
        ));
    }
    if let Some(extra) = found.keys().find(|name| !expected.contains(name)) {
        return Err(PipelineError::specification(
            table.origin(),
            format!("unknown habitat '{}'", extra),
        ));
    }
    Ok(())
}

fn unrecognized(origin: &str, field: Field, label: &str) -> PipelineError {
    PipelineError::specification(
        origin,
        format!("unrecognized {} label '{}'", field.source_header(), label),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn source_table(file: &str, headers: &[&str], rows: &[&[&str]]) -> SourceTable {
        SourceTable {
            path: PathBuf::from(file),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|v| (!v.is_empty()).then(|| v.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    fn globals() -> serde_json::Map<String, Value> {
        let value = json!({
            "Distinctiveness": {"V.High": 8, "High": 6, "Medium": 4, "Low": 2, "V.Low": 0},
            "Condition": {"Good": 3, "Moderate": 2, "Poor": 1, "N/A - Agricultural": 1},
            "Strategic Significance": {
                "Within area formally identified in local strategy": 1.15,
                "Location ecologically desirable but not in local strategy": 1.1,
                "Area/compensation not in local strategy/ no local strategy": 1
            },
            "Spatial Risk": {
                "Compensation inside LPA boundary or NCA of impact site": 1
            },
            "Technical Difficulty": {"Very High": 0.1, "High": 0.33, "Medium": 0.67, "Low": 1},
            "Discount Rate": 3.5
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn spec() -> SourceSpec {
        SourceSpec {
            distinctiveness: source_table(
                "distinctiveness.tsv",
                &["Habitat Description", "Distinctiveness"],
                &[
                    &["Wetland - Lowland fens", "V.High"],
                    &["Grassland - Modified grassland", "Low"],
                ],
            ),
            creation_difficulty: source_table(
                "creation_difficulty.tsv",
                &["Habitat Description", "Technical Difficulty Creation"],
                &[
                    &["Wetland - Lowland fens", "Not Possible"],
                    &["Grassland - Modified grassland", "Low"],
                ],
            ),
            enhancement_difficulty: source_table(
                "enhancement_difficulty.tsv",
                &["Habitat Description", "Technical Difficulty Enhancement"],
                &[
                    &["Wetland - Lowland fens", "High"],
                    &["Grassland - Modified grassland", "Low"],
                ],
            ),
            creation_time: source_table(
                "creation_time.tsv",
                &["Habitat Description", "Good", "Poor", "N/A - Agricultural"],
                &[
                    &["Wetland - Lowland fens", "Not Possible", "Not Possible", "Not Possible"],
                    &["Grassland - Modified grassland", "4", "1", "1"],
                ],
            ),
            enhancement_time: source_table(
                "enhancement_time.tsv",
                &["Habitat Description", "Lower Distinctiveness Habitat - Good", "Poor - Moderate"],
                &[
                    &["Wetland - Lowland fens", "30+", "10"],
                    &["Grassland - Modified grassland", "4", "2"],
                ],
            ),
            globals: globals(),
        }
    }

    fn options() -> GeneratorOptions {
        GeneratorOptions {
            expected_habitats: Some(2),
        }
    }

    fn expect_spec_error(spec: &SourceSpec, needle: &str) {
        let err = generate(spec, &RuleSet::standard(), &options()).unwrap_err();
        assert!(err.is_specification_error(), "{err}");
        assert!(err.to_string().contains(needle), "{err}");
    }

    #[test]
    fn test_generate_keeps_source_wording() {
        let raw = generate(&spec(), &RuleSet::standard(), &options()).unwrap();

        assert_eq!(raw.habitats.len(), 2);
        let fens = &raw.habitats["Lowland fens"];
        assert_eq!(fens[&Field::Habitat], RawCell::Label("Lowland fens".into()));
        assert_eq!(fens[&Field::BroadHabitat], RawCell::Label("Wetland".into()));
        assert_eq!(fens[&Field::Distinctiveness], RawCell::Label("V.High".into()));
        assert_eq!(fens[&Field::CreationDifficulty], RawCell::Label("Not Possible".into()));

        let RawCell::Grid(creation) = &fens[&Field::CreationTime] else {
            panic!("creation time is not a grid");
        };
        assert_eq!(creation["N/A - Agricultural"], "Not Possible");

        let RawCell::Grid(enhancement) = &fens[&Field::EnhancementTime] else {
            panic!("enhancement time is not a grid");
        };
        assert_eq!(enhancement["Lower Distinctiveness Habitat - Good"], "30+");

        match &raw.globals[&Field::StrategicSignificance] {
            RawGlobal::Scores(scores) => {
                assert!(scores.contains_key("Within area formally identified in local strategy"))
            }
            other => panic!("unexpected globals block: {:?}", other),
        }
        assert!(matches!(raw.globals[&Field::Depreciation], RawGlobal::Scalar(_)));
    }

    #[test]
    fn test_sentinel_prefixed_difficulty() {
        let mut spec = spec();
        spec.creation_difficulty.rows[1][1] = Some("N/A - Low".to_string());
        spec.enhancement_difficulty.rows[0][1] = Some("N/A -High".to_string());

        let raw = generate(&spec, &RuleSet::standard(), &options()).unwrap();
        assert_eq!(
            raw.habitats["Modified grassland"][&Field::CreationDifficulty],
            RawCell::Label("N/A - Low".into())
        );
        assert_eq!(
            raw.habitats["Lowland fens"][&Field::EnhancementDifficulty],
            RawCell::Label("N/A -High".into())
        );
    }

    #[test]
    fn test_difficulty_rejects_years() {
        let mut spec = spec();
        spec.creation_difficulty.rows[1][1] = Some("30+".to_string());
        expect_spec_error(&spec, "30+");
    }

    #[test]
    fn test_unrecognized_label() {
        let mut spec = spec();
        spec.distinctiveness.rows[1][1] = Some("Quite Low".to_string());
        expect_spec_error(&spec, "Quite Low");
    }

    #[test]
    fn test_unrecognized_time() {
        let mut spec = spec();
        spec.creation_time.rows[1][1] = Some("about 4".to_string());
        expect_spec_error(&spec, "about 4");
    }

    #[test]
    fn test_unrecognized_condition_column() {
        let mut spec = spec();
        spec.creation_time.headers[2] = "Excellent".to_string();
        expect_spec_error(&spec, "Excellent");
    }

    #[test]
    fn test_unrecognized_transition_column() {
        let mut spec = spec();
        spec.enhancement_time.headers[2] = "Poor to Moderate".to_string();
        expect_spec_error(&spec, "Poor to Moderate");
    }

    #[test]
    fn test_missing_column() {
        let mut spec = spec();
        spec.creation_difficulty.headers[1] = "Difficulty".to_string();
        expect_spec_error(&spec, "Technical Difficulty Creation");
    }

    #[test]
    fn test_missing_global() {
        let mut spec = spec();
        spec.globals.remove("Spatial Risk");
        expect_spec_error(&spec, "Spatial Risk");
    }

    #[test]
    fn test_unknown_global() {
        let mut spec = spec();
        spec.globals.insert("Irreplaceability".to_string(), json!({"Yes": 1}));
        expect_spec_error(&spec, "Irreplaceability");
    }

    #[test]
    fn test_global_shape() {
        let mut spec = spec();
        spec.globals.insert("Discount Rate".to_string(), json!({"Low": 1}));
        expect_spec_error(&spec, "Discount Rate");
    }

    #[test]
    fn test_empty_cell() {
        let mut spec = spec();
        spec.enhancement_difficulty.rows[0][1] = None;
        expect_spec_error(&spec, "empty");
    }

    #[test]
    fn test_habitat_mismatch() {
        let mut spec = spec();
        spec.enhancement_time.rows[1][0] = Some("Grassland - Other neutral grassland".to_string());
        expect_spec_error(&spec, "missing habitat 'Modified grassland'");
    }

    #[test]
    fn test_duplicate_habitat() {
        let mut spec = spec();
        spec.distinctiveness.rows[1][0] = Some("Wetland - Lowland fens".to_string());
        expect_spec_error(&spec, "duplicate habitat 'Lowland fens'");
    }

    #[test]
    fn test_habitat_count() {
        let err = generate(&spec(), &RuleSet::standard(), &GeneratorOptions::default()).unwrap_err();
        assert!(err.to_string().contains("expected 128 habitats, found 2"));

        let unchecked = GeneratorOptions {
            expected_habitats: None,
        };
        assert!(generate(&spec(), &RuleSet::standard(), &unchecked).is_ok());
    }

    #[test]
    fn test_malformed_description() {
        let mut spec = spec();
        spec.distinctiveness.rows[0][0] = Some("Lowland fens".to_string());
        expect_spec_error(&spec, "Broad habitat");
    }
}
