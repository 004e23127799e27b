use serde::{Deserialize, Serialize};

/// A single catalog-defined genomic position relevant to a gene.
///
/// Positions are 1-based and immutable once the catalog is loaded. The
/// ordered list of loci for a gene defines the coordinate system that every
/// [`NamedAllele`](crate::definition::NamedAllele) allele-code vector is
/// aligned against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantLocus {
    /// Chromosome name (e.g. `chr10`)
    pub chromosome: String,

    /// 1-based genomic position
    pub position: u64,

    /// External identifier (dbSNP rsid), if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,

    /// Reference allele at this position
    pub ref_allele: String,

    /// Known alternative alleles, in catalog order
    pub alt_alleles: Vec<String>,
}

impl VariantLocus {
    pub fn new(
        chromosome: impl Into<String>,
        position: u64,
        ref_allele: impl Into<String>,
        alt_alleles: Vec<String>,
    ) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
            rsid: None,
            ref_allele: ref_allele.into(),
            alt_alleles,
        }
    }

    #[must_use]
    pub fn with_rsid(mut self, rsid: impl Into<String>) -> Self {
        self.rsid = Some(rsid.into());
        self
    }

    /// Key used to look this locus up against sample data
    #[must_use]
    pub fn key(&self) -> (String, u64) {
        (self.chromosome.clone(), self.position)
    }

    /// Check whether an observed allele is one this locus knows about
    /// (reference or a listed alternative).
    #[must_use]
    pub fn knows_allele(&self, allele: &str) -> bool {
        self.ref_allele == allele || self.alt_alleles.iter().any(|a| a == allele)
    }

    /// HGVS-style label for an observed allele at this position,
    /// e.g. `g.94781859G>A`. Used to name off-reference partials.
    #[must_use]
    pub fn hgvs_for_allele(&self, allele: &str) -> String {
        if self.ref_allele.len() == 1 && allele.len() == 1 {
            format!("g.{}{}>{}", self.position, self.ref_allele, allele)
        } else {
            // Indels get the delins form; precise normalization is not
            // needed for a label that only has to be unique and readable.
            format!("g.{}del{}ins{}", self.position, self.ref_allele, allele)
        }
    }
}

/// Expand an allele code into the set of literal alleles it stands for.
///
/// Single-letter IUPAC ambiguity codes expand to their base sets; anything
/// else (including multi-base literals such as indel alleles) is returned
/// as-is. Expansion order is fixed so permutation sets are deterministic.
#[must_use]
pub fn expand_allele(code: &str) -> Vec<String> {
    if code.len() == 1 {
        if let Some(bases) = iupac_bases(code.as_bytes()[0]) {
            return bases.iter().map(|b| b.to_string()).collect();
        }
    }
    vec![code.to_string()]
}

/// True when the code is an IUPAC ambiguity code (stands for more than one base).
#[must_use]
pub fn is_ambiguity_code(code: &str) -> bool {
    code.len() == 1 && iupac_bases(code.as_bytes()[0]).is_some()
}

fn iupac_bases(code: u8) -> Option<&'static [char]> {
    match code.to_ascii_uppercase() {
        b'R' => Some(&['A', 'G']),
        b'Y' => Some(&['C', 'T']),
        b'S' => Some(&['C', 'G']),
        b'W' => Some(&['A', 'T']),
        b'K' => Some(&['G', 'T']),
        b'M' => Some(&['A', 'C']),
        b'B' => Some(&['C', 'G', 'T']),
        b'D' => Some(&['A', 'G', 'T']),
        b'H' => Some(&['A', 'C', 'T']),
        b'V' => Some(&['A', 'C', 'G']),
        b'N' => Some(&['A', 'C', 'G', 'T']),
        _ => None,
    }
}
