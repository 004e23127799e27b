//! Per-gene working set: the catalog restricted to positions the sample
//! covers, plus every haploid permutation pair the sample could be.

use std::collections::BTreeSet;

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::definition::allele::Sequence;
use crate::definition::locus::{expand_allele, is_ambiguity_code};
use crate::definition::store::CatalogError;
use crate::definition::{GeneDefinition, NamedAllele, VariantLocus};
use crate::sample::{SampleAllele, SampleData};

/// Default ceiling on generated permutation pairs per gene.
pub const DEFAULT_PERMUTATION_CAP: usize = 1 << 20;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("No catalog position for {gene} has sample data")]
    NoCoverage { gene: String },

    #[error("{gene} would generate {count} permutations (cap {cap})")]
    ExcessivePermutations {
        gene: String,
        count: usize,
        cap: usize,
    },

    #[error("Catalog conflict in {gene}: {detail}")]
    CatalogConflict { gene: String, detail: String },

    #[error(transparent)]
    Definition(#[from] CatalogError),
}

/// The per-gene matcher input: kept positions, restricted named alleles,
/// per-position sample calls, and the sample's permutation pairs.
///
/// Owned exclusively by one gene task; nothing here is shared.
#[derive(Debug, Clone)]
pub struct MatchData {
    pub gene: String,

    /// Catalog positions the sample has data for, ascending
    pub positions: Vec<VariantLocus>,

    /// Catalog positions the sample lacks
    pub missing_positions: Vec<VariantLocus>,

    /// Named alleles projected onto `positions` and re-scored
    pub haplotypes: Vec<NamedAllele>,

    /// Sample calls, aligned with `positions`
    pub sample: Vec<SampleAllele>,

    /// True when every kept call is phased or homozygous
    pub phased: bool,

    /// True when every kept call is homozygous
    pub effectively_phased: bool,

    /// Positions where a sample allele was an IUPAC code and was expanded
    pub ambiguous_positions: Vec<u64>,

    /// Every (strand 1, strand 2) assignment consistent with the sample.
    /// Ordered pairs when `phased`; canonicalized unordered pairs otherwise.
    pub permutation_pairs: Vec<(Sequence, Sequence)>,

    /// Union of both sides of `permutation_pairs`
    pub permutations: BTreeSet<Sequence>,
}

impl MatchData {
    /// Build the working set for one gene.
    ///
    /// # Errors
    ///
    /// [`MatchError::NoCoverage`] when the sample asserts none of the gene's
    /// positions; [`MatchError::ExcessivePermutations`] when expansion would
    /// exceed `permutation_cap`.
    pub fn new(
        gene: &GeneDefinition,
        sample: &SampleData,
        permutation_cap: usize,
    ) -> Result<Self, MatchError> {
        let mut keep: Vec<usize> = Vec::new();
        let mut calls: Vec<SampleAllele> = Vec::new();
        let mut missing: Vec<VariantLocus> = Vec::new();

        for (i, locus) in gene.loci.iter().enumerate() {
            match sample.get(&locus.chromosome, locus.position) {
                Some(call) => {
                    keep.push(i);
                    calls.push(call.clone());
                }
                None => missing.push(locus.clone()),
            }
        }

        if keep.is_empty() {
            return Err(MatchError::NoCoverage {
                gene: gene.gene.clone(),
            });
        }

        let positions: Vec<VariantLocus> = keep.iter().map(|&i| gene.loci[i].clone()).collect();
        let haplotypes = gene
            .alleles
            .iter()
            .map(|a| a.restrict(&keep, &positions, &missing))
            .collect::<Result<Vec<_>, _>>()?;

        let effectively_phased = calls.iter().all(SampleAllele::is_homozygous);
        let phased = calls.iter().all(SampleAllele::is_effectively_phased);

        let ambiguous_positions: Vec<u64> = calls
            .iter()
            .filter(|c| is_ambiguity_code(&c.allele1) || is_ambiguity_code(&c.allele2))
            .map(|c| c.position)
            .collect();

        let (permutation_pairs, permutations) =
            permute(&gene.gene, &calls, phased, permutation_cap)?;

        debug!(
            "{}: {} of {} positions covered, {} permutation pairs",
            gene.gene,
            positions.len(),
            gene.loci.len(),
            permutation_pairs.len()
        );

        Ok(Self {
            gene: gene.gene.clone(),
            positions,
            missing_positions: missing,
            haplotypes,
            sample: calls,
            phased,
            effectively_phased,
            ambiguous_positions,
            permutation_pairs,
            permutations,
        })
    }

    /// The restricted reference allele.
    #[must_use]
    pub fn reference_allele(&self) -> &NamedAllele {
        self.haplotypes
            .iter()
            .find(|a| a.reference)
            .unwrap_or_else(|| panic!("gene {} has no reference allele", self.gene))
    }

    /// Index of a kept position by coordinate.
    #[must_use]
    pub fn position_index(&self, position: u64) -> Option<usize> {
        self.positions.iter().position(|l| l.position == position)
    }
}

/// Generate every (strand 1, strand 2) assignment consistent with the
/// per-position calls.
///
/// Homozygous calls contribute a single shared choice per expanded literal,
/// so they never multiply the pair count. Heterozygous calls contribute both
/// strand orientations unless the sample is phased. IUPAC sample codes
/// expand to their literal sets.
fn permute(
    gene: &str,
    calls: &[SampleAllele],
    phased: bool,
    cap: usize,
) -> Result<(Vec<(Sequence, Sequence)>, BTreeSet<Sequence>), MatchError> {
    let mut choices: Vec<Vec<(String, String)>> = Vec::with_capacity(calls.len());
    let mut total: usize = 1;

    for call in calls {
        let set1 = expand_allele(&call.allele1);
        let set2 = expand_allele(&call.allele2);

        let options: Vec<(String, String)> = if call.is_homozygous() {
            // both strands share the expanded literal
            set1.iter().map(|x| (x.clone(), x.clone())).collect()
        } else if phased {
            set1.iter()
                .cartesian_product(set2.iter())
                .map(|(x, y)| (x.clone(), y.clone()))
                .collect()
        } else {
            let mut orientations: BTreeSet<(String, String)> = BTreeSet::new();
            for x in &set1 {
                for y in &set2 {
                    orientations.insert((x.clone(), y.clone()));
                    orientations.insert((y.clone(), x.clone()));
                }
            }
            orientations.into_iter().collect()
        };

        total = total.saturating_mul(options.len());
        if total > cap {
            return Err(MatchError::ExcessivePermutations {
                gene: gene.to_string(),
                count: total,
                cap,
            });
        }
        choices.push(options);
    }

    let mut pairs: BTreeSet<(Sequence, Sequence)> = BTreeSet::new();
    for assignment in choices
        .iter()
        .map(|options| options.iter())
        .multi_cartesian_product()
    {
        let mut s1: Sequence = Vec::with_capacity(assignment.len());
        let mut s2: Sequence = Vec::with_capacity(assignment.len());
        for (x, y) in assignment {
            s1.push(Some(x.clone()));
            s2.push(Some(y.clone()));
        }
        if !phased && s2 < s1 {
            std::mem::swap(&mut s1, &mut s2);
        }
        pairs.insert((s1, s2));
    }

    let mut permutations = BTreeSet::new();
    for (s1, s2) in &pairs {
        permutations.insert(s1.clone());
        permutations.insert(s2.clone());
    }

    Ok((pairs.into_iter().collect(), permutations))
}
