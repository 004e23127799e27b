use std::collections::BTreeMap;

use tracing::warn;

/// The observed diploid call at one catalog position.
///
/// `allele1`/`allele2` are literal allele strings (never GT indexes). For
/// phased records the order is the strand order from the input; for unphased
/// records it is presentation order only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleAllele {
    pub chromosome: String,
    pub position: u64,
    pub allele1: String,
    pub allele2: String,
    /// True when the record's genotype separator was `|`
    pub phased: bool,
}

impl SampleAllele {
    /// Homozygous calls carry the same literal on both strands.
    #[must_use]
    pub fn is_homozygous(&self) -> bool {
        self.allele1 == self.allele2
    }

    /// A homozygous record is phased by construction, whatever its separator.
    #[must_use]
    pub fn is_effectively_phased(&self) -> bool {
        self.phased || self.is_homozygous()
    }

    /// Genotype as shown in variant reports, e.g. `C/T` or `C|T`.
    #[must_use]
    pub fn display(&self) -> String {
        let sep = if self.phased { '|' } else { '/' };
        format!("{}{}{}", self.allele1, sep, self.allele2)
    }
}

/// All of a sample's calls at catalog positions, keyed by locus.
///
/// Positions with no entry are missing from the sample; the match data
/// builder drops them from the gene's working set.
#[derive(Debug, Clone, Default)]
pub struct SampleData {
    alleles: BTreeMap<(String, u64), SampleAllele>,
}

impl SampleData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call. Returns `false` when a different call was already
    /// present for the same position (the caller decides whether that is
    /// fatal); exact duplicates are dropped with a warning.
    pub fn insert(&mut self, allele: SampleAllele) -> bool {
        let key = (allele.chromosome.clone(), allele.position);
        match self.alleles.get(&key) {
            None => {
                self.alleles.insert(key, allele);
                true
            }
            Some(existing) if *existing == allele => {
                warn!(
                    "duplicate record at {}:{} ignored",
                    allele.chromosome, allele.position
                );
                true
            }
            Some(_) => false,
        }
    }

    #[must_use]
    pub fn get(&self, chromosome: &str, position: u64) -> Option<&SampleAllele> {
        self.alleles.get(&(chromosome.to_string(), position))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleAllele> {
        self.alleles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(pos: u64, a1: &str, a2: &str, phased: bool) -> SampleAllele {
        SampleAllele {
            chromosome: "chr1".to_string(),
            position: pos,
            allele1: a1.to_string(),
            allele2: a2.to_string(),
            phased,
        }
    }

    #[test]
    fn test_homozygous_is_effectively_phased() {
        assert!(call(100, "C", "C", false).is_effectively_phased());
        assert!(!call(100, "C", "T", false).is_effectively_phased());
        assert!(call(100, "C", "T", true).is_effectively_phased());
    }

    #[test]
    fn test_display() {
        assert_eq!(call(100, "C", "T", false).display(), "C/T");
        assert_eq!(call(100, "C", "T", true).display(), "C|T");
    }

    #[test]
    fn test_insert_duplicate() {
        let mut data = SampleData::new();
        assert!(data.insert(call(100, "C", "T", false)));
        // identical duplicate is tolerated
        assert!(data.insert(call(100, "C", "T", false)));
        // disagreeing duplicate is not
        assert!(!data.insert(call(100, "C", "C", false)));
        assert_eq!(data.len(), 1);
    }
}
