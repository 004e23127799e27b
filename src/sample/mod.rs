//! Sample variant input: genotype normalization and the VCF reader.

pub mod genotype;
pub mod vcf;

pub use genotype::{SampleAllele, SampleData};
pub use vcf::{read_sample_file, read_sample_text, VcfError};
