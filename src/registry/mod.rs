//! Static dataset registry: one declarative entry per agency dataset,
//! assembled once at startup and passed by reference. Each entry fixes
//! the dataset's download URLs, source files, join graph and schema,
//! exactly as the upstream publishers lay the data out.

use crate::loader::TableSource;
use crate::schema::Schema;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

mod bls;
mod epa;

/// How a dataset's download URLs are obtained.
#[derive(Debug, Clone)]
pub enum DownloadPlan {
    /// A fixed list of files under a base URL.
    Static {
        base: &'static str,
        files: &'static [&'static str],
    },
    /// URLs scraped from an index page via regexes with a named `url`
    /// capture group (BLS CEW publishes per-year archives).
    Scraped {
        page: &'static str,
        base: &'static str,
        patterns: &'static [&'static str],
    },
}

/// One reference table, possibly assembled from several lookup files
/// by an ordered sequence of left-outer joins (the composite `series`
/// table of the BLS time-series datasets).
#[derive(Debug, Clone)]
pub struct ReferencePlan {
    pub name: &'static str,
    pub base: TableSource,
    /// Renames applied to the base table before any join, declared to
    /// head off column conflicts (`footnote_codes` arrives from both
    /// the series file and the fact file).
    pub renames: &'static [(&'static str, &'static str)],
    pub joins: Vec<RefJoin>,
}

#[derive(Debug, Clone)]
pub struct RefJoin {
    pub source: TableSource,
    pub on: &'static [&'static str],
}

/// One fact stream: the large file read in fragments, enriched against
/// named reference tables in declared order.
#[derive(Debug, Clone)]
pub struct FactPlan {
    pub source: TableSource,
    /// Idempotent renames for documented upstream naming quirks,
    /// applied to every fragment before anything else.
    pub renames: &'static [(&'static str, &'static str)],
    /// Columns parsed forgivingly to numeric (bad values become null)
    /// before joining.
    pub lenient_numeric: &'static [&'static str],
    pub joins: Vec<FactJoin>,
}

#[derive(Debug, Clone)]
pub struct FactJoin {
    pub reference: &'static str,
    pub on: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct ConsolidatePlan {
    pub chunk_size: usize,
    pub references: Vec<ReferencePlan>,
    pub facts: Vec<FactPlan>,
    /// Explicit output column order, for datasets whose fact streams
    /// do not share an identical column set (EPA UCMR). Fragments are
    /// projected onto this list before coercion; `None` requires all
    /// fragments to agree on shape.
    pub output_columns: Option<&'static [&'static str]>,
}

pub struct DatasetSpec {
    /// Registry key, `agency:dataset`.
    pub id: &'static str,
    pub agency: &'static str,
    pub dataset: &'static str,
    pub title: &'static str,
    pub website: &'static str,
    pub docs: &'static str,
    /// Subdirectory under the data root, e.g. `bls/ce`.
    pub subdir: &'static str,
    pub download: DownloadPlan,
    pub consolidate: ConsolidatePlan,
    pub schema: Schema,
}

pub static REGISTRY: Lazy<BTreeMap<&'static str, DatasetSpec>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    for spec in [bls::cew(), bls::ce(), bls::sm(), epa::ucmr()] {
        map.insert(spec.id, spec);
    }
    map
});

pub fn get(id: &str) -> Option<&'static DatasetSpec> {
    REGISTRY.get(id)
}

/// Distinct agency codes, in registry order.
pub fn agencies() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = REGISTRY.values().map(|s| s.agency).collect();
    out.dedup();
    out
}

pub fn datasets_for(agency: &str) -> Vec<&'static DatasetSpec> {
    REGISTRY.values().filter(|s| s.agency == agency).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_holds_all_datasets() {
        let ids: Vec<_> = REGISTRY.keys().copied().collect();
        assert_eq!(ids, vec!["bls:ce", "bls:cew", "bls:sm", "epa:ucmr"]);
    }

    #[test]
    fn fact_joins_reference_declared_tables() {
        for spec in REGISTRY.values() {
            let names: Vec<_> = spec
                .consolidate
                .references
                .iter()
                .map(|r| r.name)
                .collect();
            for fact in &spec.consolidate.facts {
                for join in &fact.joins {
                    assert!(
                        names.contains(&join.reference),
                        "{}: join against undeclared reference '{}'",
                        spec.id,
                        join.reference
                    );
                }
            }
        }
    }

    #[test]
    fn agencies_are_deduplicated() {
        assert_eq!(agencies(), vec!["bls", "epa"]);
        assert_eq!(datasets_for("bls").len(), 3);
        assert_eq!(datasets_for("epa").len(), 1);
    }
}
