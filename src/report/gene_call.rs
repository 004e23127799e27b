//! Serializable per-gene output records assembled from matcher results.

use serde::Serialize;

use crate::definition::GeneDefinition;
use crate::matching::model::{BaseMatch, Warning, COMBINATION_JOINER};
use crate::matching::{DiplotypeMatch, GeneResult};

/// One side of an emitted diplotype.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallSide {
    /// A single named allele
    Allele { id: String, name: String },
    /// A synthesized combination of named alleles
    Combination { ids: Vec<String>, name: String },
    /// An off-reference partial, labeled by HGVS-style coordinates
    OffReference { labels: Vec<String>, name: String },
}

impl CallSide {
    fn from_match(m: &BaseMatch) -> Self {
        match m {
            BaseMatch::Haplotype(h) => CallSide::Allele {
                id: h.haplotype.id.clone(),
                name: h.haplotype.name.clone(),
            },
            BaseMatch::Combination(c) if c.off_reference => CallSide::OffReference {
                labels: c
                    .haplotype
                    .name
                    .split(COMBINATION_JOINER)
                    .map(str::to_string)
                    .collect(),
                name: c.haplotype.name.clone(),
            },
            BaseMatch::Combination(c) => CallSide::Combination {
                ids: c.components.iter().map(|a| a.id.clone()).collect(),
                name: c.haplotype.name.clone(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            CallSide::Allele { name, .. }
            | CallSide::Combination { name, .. }
            | CallSide::OffReference { name, .. } => name,
        }
    }
}

/// An emitted diplotype candidate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiplotypeCall {
    pub left: CallSide,
    pub right: CallSide,
    pub score: u32,
}

impl DiplotypeCall {
    fn from_match(m: &DiplotypeMatch) -> Self {
        Self {
            left: CallSide::from_match(&m.left),
            right: CallSide::from_match(&m.right),
            score: m.score,
        }
    }

    /// Display form, e.g. `*1/*2`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}/{}", self.left.name(), self.right.name())
    }
}

/// Per-position report for one gene.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VariantReport {
    pub position: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,

    /// Observed genotype (`C/T`, `C|T`); absent when the position is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,

    /// Homozygous/heterozygous classification; absent when missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zygosity: Option<Zygosity>,

    /// No sample data at this catalog position
    pub missing: bool,

    /// An observed allele is neither the reference nor a listed alternative
    pub mismatch: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Zygosity {
    Homozygous,
    Heterozygous,
}

/// The complete per-gene record handed to downstream consumers.
///
/// Field order is fixed by declaration and every list is emitted in ranked
/// order, so identical inputs serialize byte-identically.
#[derive(Debug, Clone, Serialize)]
pub struct GeneCall {
    pub gene: String,
    pub called: bool,
    pub phased: bool,
    pub diplotypes: Vec<DiplotypeCall>,
    pub combinations: Vec<DiplotypeCall>,
    pub variants: Vec<VariantReport>,
    pub warnings: Vec<Warning>,
}

impl GeneCall {
    /// Assemble the output record for one gene.
    #[must_use]
    pub fn from_result(result: &GeneResult, gene: &GeneDefinition) -> Self {
        let data = result.match_data.as_ref();
        let variants = gene
            .loci
            .iter()
            .map(|locus| {
                let call =
                    data.and_then(|d| d.position_index(locus.position).map(|i| &d.sample[i]));
                match call {
                    Some(sample) => VariantReport {
                        position: locus.position,
                        rsid: locus.rsid.clone(),
                        call: Some(sample.display()),
                        zygosity: Some(if sample.is_homozygous() {
                            Zygosity::Homozygous
                        } else {
                            Zygosity::Heterozygous
                        }),
                        missing: false,
                        mismatch: !locus.knows_allele(&sample.allele1)
                            || !locus.knows_allele(&sample.allele2),
                    },
                    None => VariantReport {
                        position: locus.position,
                        rsid: locus.rsid.clone(),
                        call: None,
                        zygosity: None,
                        missing: true,
                        mismatch: false,
                    },
                }
            })
            .collect();

        Self {
            gene: result.gene.clone(),
            called: result.called(),
            phased: result.phased,
            diplotypes: result.diplotypes.iter().map(DiplotypeCall::from_match).collect(),
            combinations: result
                .combinations
                .iter()
                .map(DiplotypeCall::from_match)
                .collect(),
            variants,
            warnings: result.warnings.clone(),
        }
    }
}
