//! The allele-definition model: catalog positions, named alleles, gene
//! definitions, and the loaded catalog with its lookup indexes.

pub mod allele;
pub mod gene;
pub mod locus;
pub mod store;

pub use allele::{sequences_compatible, NamedAllele, Sequence};
pub use gene::GeneDefinition;
pub use locus::{expand_allele, is_ambiguity_code, VariantLocus};
pub use store::{CatalogError, DefinitionCatalog};
