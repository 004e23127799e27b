use serde::{Deserialize, Serialize};

use crate::definition::allele::NamedAllele;
use crate::definition::locus::VariantLocus;
use crate::definition::store::CatalogError;

/// A gene's complete allele-definition table: the ordered variant positions
/// it is defined over and the named alleles expressed against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneDefinition {
    /// Gene symbol (e.g. `CYP2C19`)
    pub gene: String,

    /// Chromosome the gene's positions live on
    pub chromosome: String,

    /// Catalog positions, ascending by coordinate
    pub loci: Vec<VariantLocus>,

    /// Named alleles, allele-code vectors aligned with `loci`
    pub alleles: Vec<NamedAllele>,
}

impl GeneDefinition {
    pub fn new(gene: impl Into<String>, chromosome: impl Into<String>) -> Self {
        Self {
            gene: gene.into(),
            chromosome: chromosome.into(),
            loci: Vec::new(),
            alleles: Vec::new(),
        }
    }

    /// Validate the definition and initialize every named allele against the
    /// locus vector.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MalformedCatalog`] when positions are empty or
    /// unsorted, when the gene does not have exactly one reference allele,
    /// when the reference allele leaves a position unspecified, or when an
    /// allele-code vector is misaligned.
    pub fn initialize(&mut self) -> Result<(), CatalogError> {
        if self.loci.is_empty() {
            return Err(CatalogError::MalformedCatalog {
                detail: format!("gene {} defines no positions", self.gene),
            });
        }
        if self.loci.windows(2).any(|w| w[0].position >= w[1].position) {
            return Err(CatalogError::MalformedCatalog {
                detail: format!("gene {} positions are not strictly ascending", self.gene),
            });
        }

        let reference_count = self.alleles.iter().filter(|a| a.reference).count();
        if reference_count != 1 {
            return Err(CatalogError::MalformedCatalog {
                detail: format!(
                    "gene {} has {} reference alleles, expected exactly 1",
                    self.gene, reference_count
                ),
            });
        }

        for allele in &mut self.alleles {
            allele.initialize(&self.loci)?;
            if allele.reference && !allele.missing_positions.is_empty() {
                return Err(CatalogError::MalformedCatalog {
                    detail: format!(
                        "reference allele {} leaves {} positions unspecified",
                        allele.id,
                        allele.missing_positions.len()
                    ),
                });
            }
        }
        Ok(())
    }

    /// The gene's reference allele. Only valid after
    /// [`initialize`](GeneDefinition::initialize) has succeeded.
    #[must_use]
    pub fn reference_allele(&self) -> &NamedAllele {
        self.alleles
            .iter()
            .find(|a| a.reference)
            .unwrap_or_else(|| panic!("gene {} has no reference allele", self.gene))
    }

    /// Find a named allele by display name.
    #[must_use]
    pub fn find_allele(&self, name: &str) -> Option<&NamedAllele> {
        self.alleles.iter().find(|a| a.name == name)
    }
}
