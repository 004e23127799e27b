//! The named-allele matcher: match-data construction, the core matching
//! pass, combination synthesis, and the ranking discipline.
//!
//! Matching is single-threaded per gene; [`call_all`] fans genes out over a
//! rayon worker pool and re-sorts by symbol so the output is deterministic
//! regardless of scheduling.

pub mod combination;
pub mod data;
pub mod engine;
pub mod model;
pub mod scoring;

use rayon::prelude::*;

use crate::definition::DefinitionCatalog;
use crate::sample::SampleData;

pub use combination::CombinationBuilder;
pub use data::{MatchData, MatchError, DEFAULT_PERMUTATION_CAP};
pub use engine::{GeneResult, MatcherConfig, MatcherEngine};
pub use model::{
    BaseMatch, CombinationMatch, DiplotypeMatch, HaplotypeMatch, Warning, WarningCode,
    COMBINATION_JOINER,
};

/// Run the matching pass for every catalog gene against one sample.
///
/// Gene tasks are independent and share only the immutable catalog; results
/// come back sorted by gene symbol.
#[must_use]
pub fn call_all(
    catalog: &DefinitionCatalog,
    sample: &SampleData,
    config: &MatcherConfig,
) -> Vec<GeneResult> {
    let engine = MatcherEngine::with_config(catalog, config.clone());
    let mut results: Vec<GeneResult> = engine
        .catalog()
        .genes
        .par_iter()
        .map(|gene| engine.call_gene(gene, sample))
        .collect();
    results.sort_by(|a, b| a.gene.cmp(&b.gene));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleAllele;

    #[test]
    fn test_call_all_covers_every_gene_in_order() {
        let catalog = DefinitionCatalog::load_embedded().unwrap();
        let mut sample = SampleData::new();
        sample.insert(SampleAllele {
            chromosome: "chr10".to_string(),
            position: 94781859,
            allele1: "G".to_string(),
            allele2: "G".to_string(),
            phased: false,
        });

        let results = call_all(&catalog, &sample, &MatcherConfig::default());
        assert_eq!(results.len(), catalog.len());

        let symbols: Vec<&str> = results.iter().map(|r| r.gene.as_str()).collect();
        let mut sorted = symbols.clone();
        sorted.sort_unstable();
        assert_eq!(symbols, sorted);

        // only CYP2C19 has coverage
        for result in &results {
            assert_eq!(result.called(), result.gene == "CYP2C19");
        }
    }
}
