//! The per-gene matching pass: haplotype matching, diplotype enumeration,
//! scoring, and ranking.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::definition::allele::Sequence;
use crate::definition::{DefinitionCatalog, GeneDefinition};
use crate::matching::combination::CombinationBuilder;
use crate::matching::data::{MatchData, MatchError, DEFAULT_PERMUTATION_CAP};
use crate::matching::model::{
    BaseMatch, DiplotypeMatch, HaplotypeMatch, Warning, WarningCode,
};
use crate::matching::scoring::{compare_diplotypes, order_sides};
use crate::sample::SampleData;

/// Configuration for the matching engine
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Keep only the maximum-score tier (default); otherwise keep every
    /// candidate in ranked order
    pub top_match_only: bool,

    /// Synthesize combination alleles unconditionally, not only when no
    /// straight diplotype matches
    pub find_combinations: bool,

    /// Ceiling on generated permutation pairs per gene
    pub permutation_cap: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            top_match_only: true,
            find_combinations: false,
            permutation_cap: DEFAULT_PERMUTATION_CAP,
        }
    }
}

/// The outcome of one gene's matching pass.
///
/// Errors are captured here rather than propagated: a gene that cannot be
/// called still yields a result carrying the warnings, and the run as a
/// whole continues.
#[derive(Debug, Clone)]
pub struct GeneResult {
    pub gene: String,

    /// The working set the lists were derived from; `None` when the sample
    /// never reached matching (no coverage, permutation explosion)
    pub match_data: Option<MatchData>,

    /// Ranked straight diplotypes (each side a single named allele)
    pub diplotypes: Vec<DiplotypeMatch>,

    /// Ranked combination diplotypes, populated when combinations were
    /// requested or no straight diplotype matched
    pub combinations: Vec<DiplotypeMatch>,

    pub warnings: Vec<Warning>,

    /// True when every consumed call was phased or homozygous
    pub phased: bool,
}

impl GeneResult {
    #[must_use]
    pub fn called(&self) -> bool {
        !self.diplotypes.is_empty() || !self.combinations.is_empty()
    }

    fn uncalled(gene: &str, warning: Warning) -> Self {
        Self {
            gene: gene.to_string(),
            match_data: None,
            diplotypes: Vec::new(),
            combinations: Vec::new(),
            warnings: vec![warning],
            phased: false,
        }
    }
}

/// The main matching engine
pub struct MatcherEngine<'a> {
    catalog: &'a DefinitionCatalog,
    config: MatcherConfig,
}

impl<'a> MatcherEngine<'a> {
    /// Create a new matching engine with default configuration
    #[must_use]
    pub fn new(catalog: &'a DefinitionCatalog) -> Self {
        Self {
            catalog,
            config: MatcherConfig::default(),
        }
    }

    /// Create a new matching engine with custom configuration
    #[must_use]
    pub fn with_config(catalog: &'a DefinitionCatalog, config: MatcherConfig) -> Self {
        Self { catalog, config }
    }

    #[must_use]
    pub fn catalog(&self) -> &DefinitionCatalog {
        self.catalog
    }

    /// Run the matching pass for one gene. Never fails: per-gene errors are
    /// folded into the result's warnings.
    #[must_use]
    pub fn call_gene(&self, gene: &GeneDefinition, sample: &SampleData) -> GeneResult {
        let data = match MatchData::new(gene, sample, self.config.permutation_cap) {
            Ok(data) => data,
            Err(err @ MatchError::NoCoverage { .. }) => {
                return GeneResult::uncalled(
                    &gene.gene,
                    Warning::new(WarningCode::NoCoverage, None, err.to_string()),
                );
            }
            Err(err @ MatchError::ExcessivePermutations { .. }) => {
                return GeneResult::uncalled(
                    &gene.gene,
                    Warning::new(WarningCode::ExcessivePermutations, None, err.to_string()),
                );
            }
            Err(err) => {
                return GeneResult::uncalled(
                    &gene.gene,
                    Warning::new(WarningCode::CatalogConflict, None, err.to_string()),
                );
            }
        };

        let mut warnings: Vec<Warning> = data
            .missing_positions
            .iter()
            .map(|locus| {
                Warning::new(
                    WarningCode::PositionMissing,
                    Some(locus.position),
                    format!(
                        "{}:{} is missing from the sample",
                        locus.chromosome, locus.position
                    ),
                )
            })
            .collect();
        for &position in &data.ambiguous_positions {
            warnings.push(Warning::new(
                WarningCode::AmbiguityExpanded,
                Some(position),
                format!("ambiguity code at {}:{position} was expanded", data.gene),
            ));
        }

        let haplotype_matches = find_haplotype_matches(&data);
        debug!(
            "{}: {} of {} alleles match at least one permutation",
            data.gene,
            haplotype_matches.len(),
            data.haplotypes.len()
        );

        let mut diplotypes = straight_diplotypes(&data, &haplotype_matches);
        let mut combinations = Vec::new();

        if self.config.find_combinations || diplotypes.is_empty() {
            match combination_diplotypes(&data) {
                Ok(found) => {
                    combinations = found;
                    if self.config.find_combinations {
                        // combination results supersede the straight list
                        diplotypes.clear();
                    }
                }
                Err(err) => {
                    warnings.push(Warning::new(
                        WarningCode::CatalogConflict,
                        None,
                        err.to_string(),
                    ));
                    return GeneResult {
                        gene: data.gene.clone(),
                        phased: data.phased,
                        match_data: Some(data),
                        diplotypes: Vec::new(),
                        combinations: Vec::new(),
                        warnings,
                    };
                }
            }
        }

        self.rank(&mut diplotypes);
        self.rank(&mut combinations);

        GeneResult {
            gene: data.gene.clone(),
            phased: data.phased,
            match_data: Some(data),
            diplotypes,
            combinations,
            warnings,
        }
    }

    /// Sort candidates and, in top-match mode, keep only the best tier.
    fn rank(&self, candidates: &mut Vec<DiplotypeMatch>) {
        candidates.sort_by(compare_diplotypes);
        if self.config.top_match_only {
            if let Some(best) = candidates.first().map(|d| d.score) {
                candidates.retain(|d| d.score == best);
            }
        }
    }
}

/// Compare every restricted named allele against every sample permutation.
fn find_haplotype_matches(data: &MatchData) -> Vec<HaplotypeMatch> {
    data.haplotypes
        .iter()
        .filter_map(|allele| {
            let sequences: BTreeSet<Sequence> = data
                .permutations
                .iter()
                .filter(|seq| allele.matches_sequence(seq))
                .cloned()
                .collect();
            if sequences.is_empty() {
                None
            } else {
                Some(HaplotypeMatch::new(allele.clone(), sequences))
            }
        })
        .collect()
}

/// Enumerate diplotypes whose two sides jointly reconstitute the sample:
/// some generated permutation pair must have one side explained by each
/// haplotype (both orientations are tried when the sample is unphased).
fn straight_diplotypes(data: &MatchData, matches: &[HaplotypeMatch]) -> Vec<DiplotypeMatch> {
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut out: Vec<DiplotypeMatch> = Vec::new();

    for (i, h1) in matches.iter().enumerate() {
        for h2 in &matches[i..] {
            // either haplotype may sit on either strand
            let viable = data.permutation_pairs.iter().any(|(s1, s2)| {
                (h1.sequences.contains(s1) && h2.sequences.contains(s2))
                    || (h2.sequences.contains(s1) && h1.sequences.contains(s2))
            });
            if !viable {
                continue;
            }

            let (left, right) = order_sides(
                BaseMatch::Haplotype(h1.clone()),
                BaseMatch::Haplotype(h2.clone()),
            );
            let diplotype = DiplotypeMatch::new(left, right);
            if seen.insert(diplotype.key()) {
                out.push(diplotype);
            }
        }
    }
    out
}

/// Explain each strand of each permutation pair independently, allowing
/// synthesized combinations and off-reference partials, and pair the
/// explanations.
fn combination_diplotypes(data: &MatchData) -> Result<Vec<DiplotypeMatch>, MatchError> {
    let builder = CombinationBuilder::new(data);
    let mut cache: BTreeMap<Sequence, Vec<BaseMatch>> = BTreeMap::new();
    for seq in &data.permutations {
        cache.insert(seq.clone(), builder.candidates_for(seq)?);
    }

    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut out: Vec<DiplotypeMatch> = Vec::new();
    for (s1, s2) in &data.permutation_pairs {
        let c1 = &cache[s1];
        let c2 = &cache[s2];
        for m1 in c1 {
            for m2 in c2 {
                let (left, right) = order_sides(m1.clone(), m2.clone());
                let diplotype = DiplotypeMatch::new(left, right);
                if seen.insert(diplotype.key()) {
                    out.push(diplotype);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionCatalog;
    use crate::sample::SampleAllele;

    fn call(chrom: &str, pos: u64, a1: &str, a2: &str, phased: bool) -> SampleAllele {
        SampleAllele {
            chromosome: chrom.to_string(),
            position: pos,
            allele1: a1.to_string(),
            allele2: a2.to_string(),
            phased,
        }
    }

    fn catalog() -> DefinitionCatalog {
        DefinitionCatalog::load_embedded().unwrap()
    }

    fn names(diplotypes: &[DiplotypeMatch]) -> Vec<String> {
        diplotypes.iter().map(DiplotypeMatch::display).collect()
    }

    #[test]
    fn test_homozygous_reference_unique_diplotype() {
        let catalog = catalog();
        let engine = MatcherEngine::new(&catalog);
        let mut sample = SampleData::new();
        sample.insert(call("chr10", 94761900, "C", "C", false));
        sample.insert(call("chr10", 94762706, "A", "A", false));
        sample.insert(call("chr10", 94781859, "G", "G", false));

        let result = engine.call_gene(catalog.get("CYP2C19").unwrap(), &sample);
        assert!(result.called());
        assert!(result.phased);
        assert_eq!(names(&result.diplotypes), vec!["*1/*1"]);
        assert_eq!(result.diplotypes[0].score, 6);
    }

    #[test]
    fn test_single_het_diplotype() {
        let catalog = catalog();
        let engine = MatcherEngine::new(&catalog);
        let mut sample = SampleData::new();
        sample.insert(call("chr10", 94761900, "C", "C", false));
        sample.insert(call("chr10", 94762706, "A", "A", false));
        sample.insert(call("chr10", 94781859, "G", "A", false));

        let result = engine.call_gene(catalog.get("CYP2C19").unwrap(), &sample);
        assert_eq!(names(&result.diplotypes), vec!["*1/*2"]);
        assert!(!result.phased);
    }

    #[test]
    fn test_missing_position_yields_tied_diplotypes() {
        let catalog = catalog();
        let engine = MatcherEngine::new(&catalog);
        // rs28399504 missing; homozygous *17-marker at rs12248560
        let mut sample = SampleData::new();
        sample.insert(call("chr10", 94761900, "T", "T", false));
        sample.insert(call("chr10", 94781859, "G", "G", false));

        let result = engine.call_gene(catalog.get("CYP2C19").unwrap(), &sample);
        assert_eq!(
            names(&result.diplotypes),
            vec!["*4/*4", "*4/*17", "*17/*17"]
        );
        let scores: Vec<u32> = result.diplotypes.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![2, 2, 2]);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::PositionMissing && w.position == Some(94762706)));
    }

    #[test]
    fn test_no_coverage() {
        let catalog = catalog();
        let engine = MatcherEngine::new(&catalog);
        let sample = SampleData::new();

        let result = engine.call_gene(catalog.get("CYP2C19").unwrap(), &sample);
        assert!(!result.called());
        assert!(result.match_data.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::NoCoverage);
    }

    #[test]
    fn test_ambiguous_overlap_top_and_all_matches() {
        let catalog = catalog();
        // het at both CYP2B6 positions: (*1,*34) and (*33,*36) both reconstitute
        let mut sample = SampleData::new();
        sample.insert(call("chr19", 41512841, "G", "T", false));
        sample.insert(call("chr19", 41515263, "A", "G", false));
        let gene = catalog.get("CYP2B6").unwrap();

        let engine = MatcherEngine::new(&catalog);
        let result = engine.call_gene(gene, &sample);
        assert_eq!(names(&result.diplotypes), vec!["*1/*34"]);

        let engine = MatcherEngine::with_config(
            &catalog,
            MatcherConfig {
                top_match_only: false,
                ..MatcherConfig::default()
            },
        );
        let result = engine.call_gene(gene, &sample);
        // the partial-coverage pairings rank between the two full
        // reconstitutions
        assert_eq!(
            names(&result.diplotypes),
            vec!["*1/*34", "*1/*33", "*1/*36", "*33/*36"]
        );
        let scores: Vec<u32> = result.diplotypes.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![4, 3, 3, 2]);
    }

    #[test]
    fn test_phased_combination() {
        let catalog = catalog();
        let engine = MatcherEngine::with_config(
            &catalog,
            MatcherConfig {
                find_combinations: true,
                ..MatcherConfig::default()
            },
        );
        // *80 and *28 markers on the same strand
        let mut sample = SampleData::new();
        sample.insert(call("chr2", 233759924, "T", "C", true));
        sample.insert(call("chr2", 233760233, "CATAT", "CAT", true));

        let result = engine.call_gene(catalog.get("UGT1A1").unwrap(), &sample);
        assert!(result.phased);
        assert!(result.diplotypes.is_empty());
        assert_eq!(names(&result.combinations), vec!["*1/*28 + *80"]);
        assert_eq!(result.combinations[0].score, 4);
    }

    #[test]
    fn test_unphased_double_het_has_no_straight_call_in_combination_mode() {
        let catalog = catalog();
        let engine = MatcherEngine::with_config(
            &catalog,
            MatcherConfig {
                find_combinations: true,
                ..MatcherConfig::default()
            },
        );
        let mut sample = SampleData::new();
        sample.insert(call("chr2", 233759924, "T", "C", false));
        sample.insert(call("chr2", 233760233, "CATAT", "CAT", false));

        let result = engine.call_gene(catalog.get("UGT1A1").unwrap(), &sample);
        assert!(!result.phased);
        assert!(result.diplotypes.is_empty());
        assert!(!result.combinations.is_empty());
    }

    #[test]
    fn test_off_reference_partial_fallback() {
        let catalog = catalog();
        let engine = MatcherEngine::new(&catalog);
        // A at rs1142345 matches no TPMT allele code (T ref, C alt)
        let mut sample = SampleData::new();
        sample.insert(call("chr6", 18130918, "T", "A", false));
        sample.insert(call("chr6", 18143724, "C", "C", false));

        let result = engine.call_gene(catalog.get("TPMT").unwrap(), &sample);
        assert!(result.diplotypes.is_empty());
        assert_eq!(names(&result.combinations), vec!["*1/g.18130918T>A"]);
        let partial = &result.combinations[0].right;
        assert!(partial.is_off_reference_partial());
        assert_eq!(partial.score(), 0);
    }

    #[test]
    fn test_deterministic_output() {
        let catalog = catalog();
        let engine = MatcherEngine::new(&catalog);
        let mut sample = SampleData::new();
        sample.insert(call("chr10", 94761900, "C", "T", false));
        sample.insert(call("chr10", 94762706, "A", "A", false));
        sample.insert(call("chr10", 94781859, "G", "A", false));
        let gene = catalog.get("CYP2C19").unwrap();

        let a = engine.call_gene(gene, &sample);
        let b = engine.call_gene(gene, &sample);
        assert_eq!(names(&a.diplotypes), names(&b.diplotypes));
        assert_eq!(names(&a.combinations), names(&b.combinations));
        assert_eq!(a.warnings, b.warnings);
    }
}
