//! Normalization throughput over a full-size (128 habitat) raw table

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use metric_config::table::{RawCell, RawEntry, RawTable};
use metric_config::{normalize, Field, RuleSet};

fn raw_table(habitats: usize) -> RawTable {
    let bands = ["V.High", "High", "Medium", "Low", "V.Low"];
    let conditions = ["Good", "Fairly Good", "Moderate", "Fairly Poor", "Poor", "N/A - Agricultural", "N/A -Other"];
    let times = ["30+", "Not Possible", "10", "5"];

    let mut table = RawTable::default();
    for i in 0..habitats {
        let mut entry = RawEntry::new();
        let name = format!("Habitat {}", i);
        entry.insert(Field::Habitat, RawCell::Label(name.clone()));
        entry.insert(Field::BroadHabitat, RawCell::Label("Grassland".to_string()));
        entry.insert(Field::Distinctiveness, RawCell::Label(bands[i % bands.len()].to_string()));
        entry.insert(Field::CreationDifficulty, RawCell::Label("Not Possible".to_string()));
        entry.insert(Field::EnhancementDifficulty, RawCell::Label("V.High".to_string()));

        let creation: BTreeMap<String, String> = conditions
            .iter()
            .enumerate()
            .map(|(j, c)| (c.to_string(), times[(i + j) % times.len()].to_string()))
            .collect();
        entry.insert(Field::CreationTime, RawCell::Grid(creation));

        let enhancement: BTreeMap<String, String> = conditions
            .iter()
            .enumerate()
            .map(|(j, c)| {
                (
                    format!("Lower Distinctiveness Habitat - {}", c),
                    times[(i + j) % times.len()].to_string(),
                )
            })
            .collect();
        entry.insert(Field::EnhancementTime, RawCell::Grid(enhancement));

        table.habitats.insert(name, entry);
    }
    table
}

fn bench_normalize(c: &mut Criterion) {
    let raw = raw_table(128);
    let rules = RuleSet::standard();

    c.bench_function("normalize_128_habitats", |b| {
        b.iter(|| normalize(black_box(&raw), black_box(&rules)))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
