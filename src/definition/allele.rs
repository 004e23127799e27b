use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::definition::locus::{expand_allele, VariantLocus};
use crate::definition::store::CatalogError;

/// One haploid assignment of alleles to an ordered set of positions.
///
/// `None` is a wildcard: an unspecified entry in an allele definition, or a
/// position with no usable call on the sample side. Wildcards compare equal
/// to anything during matching.
pub type Sequence = Vec<Option<String>>;

/// Check whether two sequences are compatible position by position.
/// A wildcard on either side matches; literals must be equal.
#[must_use]
pub fn sequences_compatible(a: &Sequence, b: &Sequence) -> bool {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).all(|(x, y)| match (x, y) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    })
}

/// Upper bound on the permutations a single allele definition may expand to.
/// A definition dense enough in ambiguity codes to exceed this is a catalog
/// authoring error, not data to be matched.
pub const MAX_DEFINITION_PERMUTATIONS: usize = 1 << 20;

fn one() -> usize {
    1
}

/// A named allele definition for a single gene.
///
/// The `alleles` vector is aligned 1:1 with the gene's ordered
/// [`VariantLocus`] list; each entry is a literal allele string, an IUPAC
/// ambiguity code, or `None` for positions the allele does not assert.
///
/// A freshly deserialized `NamedAllele` is uninitialized: its permutation
/// set, missing-position set, and score are only valid after
/// [`initialize`](NamedAllele::initialize) binds it to a locus vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedAllele {
    /// Stable identifier (e.g. `CYP2C19*2`)
    pub id: String,

    /// Display name (e.g. `*2`)
    pub name: String,

    /// Allele codes, aligned with the gene's locus vector
    pub alleles: Vec<Option<String>>,

    /// True for the gene's reference allele
    #[serde(default)]
    pub reference: bool,

    /// Number of component alleles merged into this one (1 for catalog alleles)
    #[serde(skip, default = "one")]
    pub num_combinations: usize,

    /// Number of off-reference partial positions folded into this allele
    #[serde(skip)]
    pub num_partials: usize,

    /// Genomic positions this allele does not assert; populated on
    /// initialization and extended when the allele is restricted to the
    /// positions a sample actually covers.
    #[serde(skip)]
    pub missing_positions: BTreeSet<u64>,

    /// Every concrete haploid sequence this allele stands for, after IUPAC
    /// expansion. Wildcards remain at unspecified positions.
    #[serde(skip)]
    pub permutations: BTreeSet<Sequence>,

    /// Number of positions this allele constrains (0 if overridden)
    #[serde(skip)]
    pub score: u32,

    #[serde(skip)]
    initialized: bool,
}

impl NamedAllele {
    pub fn new(id: impl Into<String>, name: impl Into<String>, alleles: Vec<Option<String>>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            alleles,
            reference: false,
            num_combinations: 1,
            num_partials: 0,
            missing_positions: BTreeSet::new(),
            permutations: BTreeSet::new(),
            score: 0,
            initialized: false,
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: bool) -> Self {
        self.reference = reference;
        self
    }

    /// Bind this allele to a locus vector: expand ambiguity codes into the
    /// permutation set, record unasserted positions as missing, and score the
    /// allele by the number of positions it constrains.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MalformedCatalog`] when the allele-code vector
    /// is not aligned with the locus vector or the expansion exceeds
    /// [`MAX_DEFINITION_PERMUTATIONS`].
    pub fn initialize(&mut self, loci: &[VariantLocus]) -> Result<(), CatalogError> {
        self.initialize_impl(loci, None)
    }

    /// Like [`initialize`](NamedAllele::initialize) but forces the score,
    /// used for off-reference partials whose score is always 0.
    pub fn initialize_with_score(
        &mut self,
        loci: &[VariantLocus],
        score: u32,
    ) -> Result<(), CatalogError> {
        self.initialize_impl(loci, Some(score))
    }

    fn initialize_impl(
        &mut self,
        loci: &[VariantLocus],
        score_override: Option<u32>,
    ) -> Result<(), CatalogError> {
        if self.alleles.len() != loci.len() {
            return Err(CatalogError::MalformedCatalog {
                detail: format!(
                    "allele {} has {} codes for {} positions",
                    self.id,
                    self.alleles.len(),
                    loci.len()
                ),
            });
        }

        self.missing_positions = self
            .alleles
            .iter()
            .zip(loci.iter())
            .filter(|(code, _)| code.is_none())
            .map(|(_, locus)| locus.position)
            .collect();

        // Per-position choice sets: a single wildcard for unspecified
        // entries, the IUPAC expansion otherwise.
        let mut total: usize = 1;
        let mut choices: Vec<Vec<Option<String>>> = Vec::with_capacity(self.alleles.len());
        for code in &self.alleles {
            let options: Vec<Option<String>> = match code {
                None => vec![None],
                Some(code) => expand_allele(code).into_iter().map(Some).collect(),
            };
            total = total.saturating_mul(options.len());
            if total > MAX_DEFINITION_PERMUTATIONS {
                return Err(CatalogError::MalformedCatalog {
                    detail: format!("allele {} expands to too many permutations", self.id),
                });
            }
            choices.push(options);
        }

        self.permutations = cartesian(&choices);
        self.score = score_override
            .unwrap_or_else(|| self.alleles.iter().filter(|a| a.is_some()).count() as u32);
        self.initialized = true;
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True when at least one of this allele's permutations is compatible
    /// with the given sample sequence.
    #[must_use]
    pub fn matches_sequence(&self, seq: &Sequence) -> bool {
        debug_assert!(self.initialized, "allele {} not initialized", self.id);
        self.permutations.iter().any(|p| sequences_compatible(p, seq))
    }

    /// Project this allele onto a subset of its positions, extending the
    /// missing set with the positions that were dropped. The result is
    /// re-initialized (and re-scored) against the kept loci.
    pub fn restrict(
        &self,
        keep: &[usize],
        kept_loci: &[VariantLocus],
        dropped_loci: &[VariantLocus],
    ) -> Result<NamedAllele, CatalogError> {
        let mut restricted = NamedAllele::new(
            self.id.clone(),
            self.name.clone(),
            keep.iter().map(|&i| self.alleles[i].clone()).collect(),
        )
        .with_reference(self.reference);
        restricted.num_combinations = self.num_combinations;
        restricted.num_partials = self.num_partials;
        restricted.initialize(kept_loci)?;
        restricted
            .missing_positions
            .extend(self.missing_positions.iter().copied());
        restricted
            .missing_positions
            .extend(dropped_loci.iter().map(|l| l.position));
        Ok(restricted)
    }
}

fn cartesian(choices: &[Vec<Option<String>>]) -> BTreeSet<Sequence> {
    use itertools::Itertools;
    if choices.is_empty() {
        return BTreeSet::new();
    }
    choices
        .iter()
        .map(|options| options.iter().cloned())
        .multi_cartesian_product()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loci() -> Vec<VariantLocus> {
        vec![
            VariantLocus::new("chr1", 100, "C", vec!["T".to_string()]),
            VariantLocus::new("chr1", 200, "A", vec!["G".to_string()]),
        ]
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_initialize_literal() {
        let mut allele = NamedAllele::new("G*2", "*2", vec![some("T"), None]);
        allele.initialize(&loci()).unwrap();

        assert_eq!(allele.score, 1);
        assert_eq!(allele.missing_positions.len(), 1);
        assert!(allele.missing_positions.contains(&200));
        assert_eq!(allele.permutations.len(), 1);
        assert!(allele.permutations.contains(&vec![some("T"), None]));
    }

    #[test]
    fn test_initialize_iupac_expansion() {
        let mut allele = NamedAllele::new("G*3", "*3", vec![some("Y"), some("G")]);
        allele.initialize(&loci()).unwrap();

        assert_eq!(allele.score, 2);
        assert_eq!(allele.permutations.len(), 2);
        assert!(allele.permutations.contains(&vec![some("C"), some("G")]));
        assert!(allele.permutations.contains(&vec![some("T"), some("G")]));
    }

    #[test]
    fn test_initialize_misaligned() {
        let mut allele = NamedAllele::new("G*4", "*4", vec![some("T")]);
        assert!(allele.initialize(&loci()).is_err());
    }

    #[test]
    fn test_reinitialize_is_stable() {
        let mut allele = NamedAllele::new("G*3", "*3", vec![some("R"), None]);
        allele.initialize(&loci()).unwrap();
        let perms = allele.permutations.clone();
        let score = allele.score;

        allele.initialize(&loci()).unwrap();
        assert_eq!(allele.permutations, perms);
        assert_eq!(allele.score, score);
    }

    #[test]
    fn test_score_override() {
        let mut allele = NamedAllele::new("G*1", "*1", vec![some("C"), some("A")]);
        allele.initialize_with_score(&loci(), 0).unwrap();
        assert_eq!(allele.score, 0);
    }

    #[test]
    fn test_matches_sequence_wildcards() {
        let mut allele = NamedAllele::new("G*2", "*2", vec![some("T"), None]);
        allele.initialize(&loci()).unwrap();

        assert!(allele.matches_sequence(&vec![some("T"), some("A")]));
        assert!(allele.matches_sequence(&vec![some("T"), some("G")]));
        // wildcard on the sample side matches too
        assert!(allele.matches_sequence(&vec![None, some("A")]));
        assert!(!allele.matches_sequence(&vec![some("C"), some("A")]));
    }

    #[test]
    fn test_restrict() {
        let full = vec![
            VariantLocus::new("chr1", 100, "C", vec!["T".to_string()]),
            VariantLocus::new("chr1", 200, "A", vec!["G".to_string()]),
            VariantLocus::new("chr1", 300, "G", vec!["A".to_string()]),
        ];
        let mut allele = NamedAllele::new("G*5", "*5", vec![some("T"), None, some("A")]);
        allele.initialize(&full).unwrap();
        assert_eq!(allele.score, 2);

        let kept = vec![full[0].clone(), full[1].clone()];
        let restricted = allele.restrict(&[0, 1], &kept, &[full[2].clone()]).unwrap();

        assert_eq!(restricted.alleles, vec![some("T"), None]);
        assert_eq!(restricted.score, 1);
        // the dropped position and the originally-unspecified one are both missing
        assert!(restricted.missing_positions.contains(&300));
        assert!(restricted.missing_positions.contains(&200));
    }
}
