//! On-demand synthesis of combination alleles and off-reference partials.
//!
//! A combination is a merge of two or more named alleles that all match the
//! same strand sequence and constrain pairwise-disjoint positions. The
//! merged allele takes each position from its unique contributor, its name
//! and identifier join the components with `" + "`, and its score is the sum
//! of the component scores.
//!
//! When no catalog allele matches a strand at all, the fallback is an
//! off-reference partial: the reference allele plus an HGVS-style label for
//! every position where the strand departs from it. Partials score 0, sort
//! last, and are never merged further.

use std::collections::BTreeSet;

use crate::definition::allele::Sequence;
use crate::definition::NamedAllele;
use crate::matching::data::{MatchData, MatchError};
use crate::matching::model::{BaseMatch, CombinationMatch, HaplotypeMatch, COMBINATION_JOINER};
use crate::matching::scoring::{compare_allele_names, compare_matches};

/// Builds the candidate explanations for single strand sequences.
pub struct CombinationBuilder<'a> {
    data: &'a MatchData,
}

impl<'a> CombinationBuilder<'a> {
    #[must_use]
    pub fn new(data: &'a MatchData) -> Self {
        Self { data }
    }

    /// Every way to explain one strand sequence: plain named-allele matches,
    /// disjoint-position merges, and (only when nothing else matches) an
    /// off-reference partial. Sorted best-first.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::CatalogConflict`] if two merge components turn
    /// out to specify the same position, which indicates a catalog error.
    pub fn candidates_for(&self, seq: &Sequence) -> Result<Vec<BaseMatch>, MatchError> {
        let mut singles: Vec<&NamedAllele> = self
            .data
            .haplotypes
            .iter()
            .filter(|a| a.matches_sequence(seq))
            .collect();
        singles.sort_by(|a, b| compare_allele_names(&a.name, &b.name));

        let mut candidates: Vec<BaseMatch> = singles
            .iter()
            .map(|&a| {
                BaseMatch::Haplotype(HaplotypeMatch::new(
                    a.clone(),
                    BTreeSet::from([seq.clone()]),
                ))
            })
            .collect();

        // Grow merge sets incrementally: each matching non-reference allele
        // either extends an existing disjoint set or starts a new one.
        let mergeable: Vec<&NamedAllele> = singles
            .iter()
            .copied()
            .filter(|a| !a.reference)
            .collect();
        let mut sets: Vec<Vec<&NamedAllele>> = Vec::new();
        for allele in mergeable {
            let mut grown: Vec<Vec<&NamedAllele>> = Vec::new();
            for set in &sets {
                if set.iter().all(|member| disjoint(member, allele)) {
                    let mut extended = set.clone();
                    extended.push(allele);
                    grown.push(extended);
                }
            }
            sets.extend(grown);
            sets.push(vec![allele]);
        }

        for set in sets.iter().filter(|s| s.len() >= 2) {
            candidates.push(self.merge(set, seq)?);
        }

        if candidates.is_empty() {
            candidates.push(self.off_reference_partial(seq)?);
        }

        candidates.sort_by(|a, b| {
            b.score()
                .cmp(&a.score())
                .then_with(|| compare_matches(a, b))
        });
        Ok(candidates)
    }

    /// Merge a disjoint set of components into a synthesized combination
    /// allele.
    fn merge(&self, components: &[&NamedAllele], seq: &Sequence) -> Result<BaseMatch, MatchError> {
        let mut components: Vec<NamedAllele> = components.iter().map(|&a| a.clone()).collect();
        components.sort_by(|a, b| compare_allele_names(&a.name, &b.name));

        let name = components
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(COMBINATION_JOINER);
        let id = components
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(COMBINATION_JOINER);

        let mut alleles: Vec<Option<String>> = vec![None; self.data.positions.len()];
        for component in &components {
            for (i, code) in component.alleles.iter().enumerate() {
                let Some(code) = code else { continue };
                if alleles[i].is_some() {
                    return Err(MatchError::CatalogConflict {
                        gene: self.data.gene.clone(),
                        detail: format!(
                            "components of {name} both specify position {}",
                            self.data.positions[i].position
                        ),
                    });
                }
                alleles[i] = Some(code.clone());
            }
        }

        let mut merged = NamedAllele::new(id, name, alleles);
        merged.num_combinations = components.len();
        merged.initialize(&self.data.positions)?;
        for component in &components {
            merged
                .missing_positions
                .extend(component.missing_positions.iter().copied());
        }

        Ok(BaseMatch::Combination(CombinationMatch {
            components,
            haplotype: merged,
            sequences: BTreeSet::from([seq.clone()]),
            off_reference: false,
        }))
    }

    /// Synthesize the reference-plus-HGVS-labels fallback for a strand no
    /// catalog allele explains.
    fn off_reference_partial(&self, seq: &Sequence) -> Result<BaseMatch, MatchError> {
        let reference = self.data.reference_allele();

        let mut labels: Vec<String> = Vec::new();
        for (i, observed) in seq.iter().enumerate() {
            let Some(observed) = observed else { continue };
            if reference.alleles[i].as_deref() != Some(observed.as_str()) {
                labels.push(self.data.positions[i].hgvs_for_allele(observed));
            }
        }

        let name = labels.join(COMBINATION_JOINER);
        let mut haplotype = NamedAllele::new(name.clone(), name, reference.alleles.clone());
        haplotype.num_partials = labels.len();
        haplotype.initialize_with_score(&self.data.positions, 0)?;
        haplotype
            .missing_positions
            .extend(reference.missing_positions.iter().copied());

        Ok(BaseMatch::Combination(CombinationMatch {
            components: vec![reference.clone()],
            haplotype,
            sequences: BTreeSet::from([seq.clone()]),
            off_reference: true,
        }))
    }
}

/// Two alleles may merge only when no position is specified by both.
fn disjoint(a: &NamedAllele, b: &NamedAllele) -> bool {
    a.alleles
        .iter()
        .zip(b.alleles.iter())
        .all(|(x, y)| x.is_none() || y.is_none())
}
