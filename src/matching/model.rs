//! Candidate match types: single named-allele matches, synthesized
//! combination matches, and the diplotype pairs built from them.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::definition::allele::Sequence;
use crate::definition::NamedAllele;

/// Separator used when joining component names and identifiers.
pub const COMBINATION_JOINER: &str = " + ";

/// One named allele explaining one or more sample permutations directly.
#[derive(Debug, Clone)]
pub struct HaplotypeMatch {
    /// The (restricted) named allele
    pub haplotype: NamedAllele,

    /// The sample permutations it explained
    pub sequences: BTreeSet<Sequence>,
}

impl HaplotypeMatch {
    #[must_use]
    pub fn new(haplotype: NamedAllele, sequences: BTreeSet<Sequence>) -> Self {
        Self {
            haplotype,
            sequences,
        }
    }
}

/// A synthesized match: either a merge of two or more component alleles with
/// pairwise-disjoint constrained positions, or an off-reference partial
/// (the reference allele plus HGVS labels for unexplained positions).
#[derive(Debug, Clone)]
pub struct CombinationMatch {
    /// Component alleles in comparator order (just the reference for an
    /// off-reference partial)
    pub components: Vec<NamedAllele>,

    /// The position-wise merge of the components
    pub haplotype: NamedAllele,

    /// The sample permutations it explains
    pub sequences: BTreeSet<Sequence>,

    /// True for off-reference partials; their score is forced to 0 and they
    /// sort after every other match
    pub off_reference: bool,
}

/// A candidate explanation for one strand of a sample.
#[derive(Debug, Clone)]
pub enum BaseMatch {
    Haplotype(HaplotypeMatch),
    Combination(CombinationMatch),
}

impl BaseMatch {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.haplotype().name
    }

    /// The matched or synthesized named allele.
    #[must_use]
    pub fn haplotype(&self) -> &NamedAllele {
        match self {
            BaseMatch::Haplotype(m) => &m.haplotype,
            BaseMatch::Combination(m) => &m.haplotype,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.haplotype().score
    }

    #[must_use]
    pub fn sequences(&self) -> &BTreeSet<Sequence> {
        match self {
            BaseMatch::Haplotype(m) => &m.sequences,
            BaseMatch::Combination(m) => &m.sequences,
        }
    }

    #[must_use]
    pub fn explains(&self, seq: &Sequence) -> bool {
        self.sequences().contains(seq)
    }

    #[must_use]
    pub fn is_off_reference_partial(&self) -> bool {
        matches!(self, BaseMatch::Combination(m) if m.off_reference)
    }

    /// Component names, one entry for a plain haplotype match.
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        match self {
            BaseMatch::Haplotype(m) => vec![m.haplotype.name.clone()],
            BaseMatch::Combination(m) => m.components.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// Component identifiers, one entry for a plain haplotype match.
    #[must_use]
    pub fn component_ids(&self) -> Vec<String> {
        match self {
            BaseMatch::Haplotype(m) => vec![m.haplotype.id.clone()],
            BaseMatch::Combination(m) => m.components.iter().map(|c| c.id.clone()).collect(),
        }
    }
}

/// A ranked diplotype candidate: two strand explanations and their summed
/// score.
#[derive(Debug, Clone)]
pub struct DiplotypeMatch {
    pub left: BaseMatch,
    pub right: BaseMatch,
    pub score: u32,
}

impl DiplotypeMatch {
    #[must_use]
    pub fn new(left: BaseMatch, right: BaseMatch) -> Self {
        let score = left.score() + right.score();
        Self { left, right, score }
    }

    /// Display name, e.g. `*1/*2`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}/{}", self.left.name(), self.right.name())
    }

    /// Key used to deduplicate candidates found via different permutation
    /// pairs.
    #[must_use]
    pub fn key(&self) -> (String, String) {
        (self.left.name().to_string(), self.right.name().to_string())
    }
}

/// Advisory message attached to a gene's result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Warning {
    pub code: WarningCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    PositionMissing,
    AmbiguityExpanded,
    NoCoverage,
    ExcessivePermutations,
    CatalogConflict,
}

impl Warning {
    #[must_use]
    pub fn new(code: WarningCode, position: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            code,
            position,
            message: message.into(),
        }
    }
}
