//! # haplomatch
//!
//! A library for calling named pharmacogene alleles (star alleles) from
//! sample variant data.
//!
//! Pharmacogenes are described by curated allele-definition tables: an
//! ordered set of genomic positions and, per named allele, the allele each
//! position carries. Given a sample's variant calls at those positions,
//! `haplomatch` enumerates the diplotypes (pairs of named alleles) that best
//! explain the observed sequence, scores them, and ranks them
//! deterministically.
//!
//! ## Features
//!
//! - **Phase-aware matching**: phased samples constrain strand assignment;
//!   unphased samples are enumerated over both orientations
//! - **Missing-position tolerance**: definitions are restricted to the
//!   positions the sample actually covers and re-scored
//! - **IUPAC expansion**: ambiguity codes in definitions and sample calls
//!   expand to their literal sets
//! - **Combination synthesis**: when no single allele fits a strand,
//!   disjoint definitions merge into combination alleles
//! - **Off-reference partials**: strands no definition explains fall back to
//!   reference-plus-HGVS-label calls
//!
//! ## Example
//!
//! ```rust,no_run
//! use haplomatch::{DefinitionCatalog, MatcherEngine};
//! use haplomatch::sample::read_sample_text;
//!
//! // Load the bundled allele definitions
//! let catalog = DefinitionCatalog::load_embedded().unwrap();
//!
//! // Parse a sample VCF
//! let vcf = std::fs::read_to_string("sample.vcf").unwrap();
//! let sample = read_sample_text(&vcf, &catalog).unwrap();
//!
//! // Call each gene
//! let engine = MatcherEngine::new(&catalog);
//! for gene in &catalog.genes {
//!     let result = engine.call_gene(gene, &sample);
//!     for diplotype in &result.diplotypes {
//!         println!("{}: {} (score {})", result.gene, diplotype.display(), diplotype.score);
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`definition`]: Allele-definition model and catalog storage
//! - [`sample`]: Sample variant reading and genotype normalization
//! - [`matching`]: The matching engine, combination synthesis, and ranking
//! - [`report`]: Per-gene output records and the outside-call layer
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod definition;
pub mod matching;
pub mod report;
pub mod sample;

// Re-export commonly used types for convenience
pub use definition::{DefinitionCatalog, GeneDefinition, NamedAllele, VariantLocus};
pub use matching::{
    call_all, BaseMatch, DiplotypeMatch, GeneResult, MatchData, MatcherConfig, MatcherEngine,
};
pub use report::{GeneCall, OutsideCall};
pub use sample::{SampleAllele, SampleData};
