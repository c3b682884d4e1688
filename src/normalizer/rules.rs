//! Rewrite Rules
//!
//! The ordered rule list turning the Metric tool's wording into canonical
//! labels. Rules are matched against whole cell values of the fields they
//! are scoped to, never against substrings of serialized text, so phrases
//! such as "Lower Distinctiveness Habitat" need no shielding from the
//! "Distinctiveness" field rename.
//!
//! Rule classes, in declaration order:
//! 1. Field renames: verbose header → snake_case key (see [`Field`])
//! 2. Sentinel prefixes: "N/A - X" / "N/A -X" → "X"
//! 3. Categorical collapsing: abbreviations and descriptive sentences → tier
//! 4. Terminal values: "Not Possible" → null, "30+" → 30, "10" → 10

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::vocabulary::{is_canonical_baseline, Field, LOWER_DISTINCTIVENESS, TRANSITION_SEPARATOR};

/// Where a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Labels of a field, including globals labels and grid keys naming
    /// conditions
    Label(Field),
    /// Grid values of creation and enhancement times
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleClass {
    Sentinel,
    Collapse,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Exact whole-string replacement
    Collapse { from: &'static str, to: &'static str },
    /// Drop a sentinel prefix, keeping the trimmed remainder
    StripPrefix(&'static str),
    /// Exact whole-string sentinel becoming null
    Nullify(&'static str),
    /// Integer followed by an open upper bound marker, floored to the integer
    OpenBound(char),
    /// Plain integer
    Years,
}

#[derive(Debug, Clone, Copy)]
pub struct RewriteRule {
    pub name: &'static str,
    pub class: RuleClass,
    pub slots: &'static [Slot],
    pub action: Action,
}

/// Intermediate and final value of a cell under rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Text(String),
    Years(u32),
    Null,
}

/// Outcome of running the rule chain over one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub term: Term,
    /// Positions of matching rules, in application order
    pub matched: SmallVec<[usize; 2]>,
}

impl RewriteRule {
    /// Apply to a term; `None` when the rule does not match
    pub fn apply(&self, term: &Term) -> Option<Term> {
        let Term::Text(text) = term else {
            return None;
        };

        match self.action {
            Action::Collapse { from, to } => (text == from).then(|| Term::Text(to.to_string())),
            Action::StripPrefix(prefix) => text
                .strip_prefix(prefix)
                .map(|rest| Term::Text(rest.trim_start().to_string())),
            Action::Nullify(sentinel) => (text == sentinel).then_some(Term::Null),
            Action::OpenBound(marker) => text
                .strip_suffix(marker)
                .and_then(parse_years)
                .map(Term::Years),
            Action::Years => parse_years(text).map(Term::Years),
        }
    }
}

fn parse_years(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

// ============================================================================
// STANDARD RULE LIST
// ============================================================================

const SENTINEL_PREFIXED: &[Slot] = &[
    Slot::Label(Field::Condition),
    Slot::Label(Field::CreationDifficulty),
    Slot::Label(Field::EnhancementDifficulty),
];

const BANDED: &[Slot] = &[
    Slot::Label(Field::Distinctiveness),
    Slot::Label(Field::Difficulty),
    Slot::Label(Field::CreationDifficulty),
    Slot::Label(Field::EnhancementDifficulty),
];

const SIGNIFICANCE: &[Slot] = &[Slot::Label(Field::StrategicSignificance)];

const SPATIAL_RISK: &[Slot] = &[Slot::Label(Field::SpatialRisk)];

const FEASIBILITY: &[Slot] = &[
    Slot::Label(Field::CreationDifficulty),
    Slot::Label(Field::EnhancementDifficulty),
    Slot::Years,
];

const YEARS: &[Slot] = &[Slot::Years];

/// Order matters: sentinel prefixes are stripped before anything compares a
/// label. Once a terminal rule turns a value into years or null, the later
/// rules in the chain no longer match it.
pub static STANDARD_RULES: &[RewriteRule] = &[
    RewriteRule {
        name: "strip-na-spaced",
        class: RuleClass::Sentinel,
        slots: SENTINEL_PREFIXED,
        action: Action::StripPrefix("N/A - "),
    },
    RewriteRule {
        name: "strip-na-unspaced",
        class: RuleClass::Sentinel,
        slots: SENTINEL_PREFIXED,
        action: Action::StripPrefix("N/A -"),
    },
    RewriteRule {
        name: "very-high",
        class: RuleClass::Collapse,
        slots: BANDED,
        action: Action::Collapse { from: "V.High", to: "Very High" },
    },
    RewriteRule {
        name: "very-low",
        class: RuleClass::Collapse,
        slots: BANDED,
        action: Action::Collapse { from: "V.Low", to: "Very Low" },
    },
    RewriteRule {
        name: "significance-high",
        class: RuleClass::Collapse,
        slots: SIGNIFICANCE,
        action: Action::Collapse {
            from: "Within area formally identified in local strategy",
            to: "High",
        },
    },
    RewriteRule {
        name: "significance-medium",
        class: RuleClass::Collapse,
        slots: SIGNIFICANCE,
        action: Action::Collapse {
            from: "Location ecologically desirable but not in local strategy",
            to: "Medium",
        },
    },
    RewriteRule {
        name: "significance-low",
        class: RuleClass::Collapse,
        slots: SIGNIFICANCE,
        action: Action::Collapse {
            from: "Area/compensation not in local strategy/ no local strategy",
            to: "Low",
        },
    },
    RewriteRule {
        name: "spatial-risk-low",
        class: RuleClass::Collapse,
        slots: SPATIAL_RISK,
        action: Action::Collapse {
            from: "Compensation inside LPA boundary or NCA of impact site",
            to: "Low",
        },
    },
    RewriteRule {
        name: "spatial-risk-medium",
        class: RuleClass::Collapse,
        slots: SPATIAL_RISK,
        action: Action::Collapse {
            from: "Compensation outside LPA or NCA of impact site, but in neighbouring LPA or NCA",
            to: "Medium",
        },
    },
    RewriteRule {
        name: "spatial-risk-high",
        class: RuleClass::Collapse,
        slots: SPATIAL_RISK,
        action: Action::Collapse {
            from: "Compensation outside LPA or NCA of impact site and beyond neighbouring LPA or NCA",
            to: "High",
        },
    },
    RewriteRule {
        name: "not-possible",
        class: RuleClass::Terminal,
        slots: FEASIBILITY,
        action: Action::Nullify("Not Possible"),
    },
    RewriteRule {
        name: "open-bound",
        class: RuleClass::Terminal,
        slots: YEARS,
        action: Action::OpenBound('+'),
    },
    RewriteRule {
        name: "years",
        class: RuleClass::Terminal,
        slots: YEARS,
        action: Action::Years,
    },
];

// ============================================================================
// RULE SET
// ============================================================================

/// Ordered rules with a per-slot index
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
    by_slot: FxHashMap<Slot, Vec<usize>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    pub fn standard() -> Self {
        Self::new(STANDARD_RULES.to_vec())
    }

    pub fn new(rules: Vec<RewriteRule>) -> Self {
        let mut by_slot: FxHashMap<Slot, Vec<usize>> = FxHashMap::default();
        for (position, rule) in rules.iter().enumerate() {
            for slot in rule.slots {
                by_slot.entry(*slot).or_default().push(position);
            }
        }
        RuleSet { rules, by_slot }
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.name == name)
    }

    /// Class 1 renames, verbose header → key
    pub fn field_renames(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        Field::ALL
            .into_iter()
            .map(|field| (field.source_header(), field.key()))
    }

    /// Run every rule scoped to `slot`, in declaration order
    pub fn rewrite(&self, slot: Slot, text: &str) -> Rewrite {
        let mut term = Term::Text(text.to_string());
        let mut matched = SmallVec::new();

        if let Some(positions) = self.by_slot.get(&slot) {
            for &position in positions {
                if let Some(next) = self.rules[position].apply(&term) {
                    term = next;
                    matched.push(position);
                }
            }
        }

        Rewrite { term, matched }
    }

    /// Whether rewriting `text` in `slot` ends in a canonical value
    pub fn recognizes(&self, slot: Slot, text: &str) -> bool {
        is_canonical_term(slot, &self.rewrite(slot, text).term)
    }

    /// Split a verbose `<baseline> - <target>` key and rewrite both sides
    ///
    /// Sides may themselves contain the separator ("N/A - Agricultural -
    /// Good"), so every split point is tried from the left until both sides
    /// rewrite to canonical labels.
    pub fn rewrite_transition(&self, key: &str) -> Option<(Rewrite, Rewrite)> {
        let mut start = 0;
        while let Some(offset) = key[start..].find(TRANSITION_SEPARATOR) {
            let split = start + offset;
            let baseline = self.rewrite_baseline(&key[..split]);
            let target = self.rewrite(
                Slot::Label(Field::Condition),
                &key[split + TRANSITION_SEPARATOR.len()..],
            );

            let baseline_ok = matches!(&baseline.term, Term::Text(t) if is_canonical_baseline(t));
            let target_ok = is_canonical_term(Slot::Label(Field::Condition), &target.term);
            if baseline_ok && target_ok {
                return Some((baseline, target));
            }

            start = split + TRANSITION_SEPARATOR.len();
        }
        None
    }

    fn rewrite_baseline(&self, text: &str) -> Rewrite {
        if text == LOWER_DISTINCTIVENESS {
            return Rewrite {
                term: Term::Text(text.to_string()),
                matched: SmallVec::new(),
            };
        }
        self.rewrite(Slot::Label(Field::Condition), text)
    }
}

/// Canonical end state for a slot
pub fn is_canonical_term(slot: Slot, term: &Term) -> bool {
    match (slot, term) {
        (Slot::Label(field), Term::Text(text)) => field.is_canonical(text),
        (Slot::Label(Field::CreationDifficulty | Field::EnhancementDifficulty), Term::Null) => true,
        (Slot::Years, Term::Years(_) | Term::Null) => true,
        _ => false,
    }
}
