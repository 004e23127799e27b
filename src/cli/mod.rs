//! Command-line interface for haplomatch.
//!
//! Available commands:
//!
//! - **call**: Call named-allele diplotypes for a sample VCF
//! - **catalog**: List or show allele definitions
//!
//! ## Usage
//!
//! ```text
//! # Call a sample against the bundled definitions
//! haplomatch call sample.vcf
//!
//! # JSON output for scripting
//! haplomatch call sample.vcf --format json
//!
//! # Keep every candidate and synthesize combination alleles
//! haplomatch call sample.vcf --all-matches --combinations
//!
//! # Inspect the catalog
//! haplomatch catalog --show CYP2C19
//! ```

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::definition::CatalogError;
use crate::report::OutsideCallError;
use crate::sample::VcfError;

pub mod call;
pub mod catalog;

#[derive(Parser)]
#[command(name = "haplomatch")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Call named pharmacogene alleles from sample variant data")]
#[command(
    long_about = "haplomatch matches a sample's variant calls against a catalog of named allele definitions and reports, per gene, the ranked diplotypes that best explain the observed sequence.\n\nIt supports phased and unphased samples, tolerates missing positions, expands IUPAC ambiguity codes, and can synthesize combination alleles and off-reference partials when no catalog allele fits."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Call diplotypes for a sample VCF
    Call(call::CallArgs),

    /// Inspect the allele-definition catalog
    Catalog(catalog::CatalogArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Failures at the command boundary, mapped to the tool's exit codes.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Sample(#[from] VcfError),

    #[error(transparent)]
    OutsideCall(#[from] OutsideCallError),

    #[error("every covered gene exceeded the permutation cap")]
    ExcessivePermutations,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Exit code contract: 0 success, 2 bad catalog, 3 bad sample,
    /// 4 excessive permutations, 1 anything else.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Catalog(_) => 2,
            CliError::Sample(_) | CliError::OutsideCall(_) => 3,
            CliError::ExcessivePermutations => 4,
            CliError::Io(_) | CliError::Json(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let catalog = CliError::Catalog(CatalogError::MalformedCatalog {
            detail: "x".to_string(),
        });
        assert_eq!(catalog.exit_code(), 2);

        let sample = CliError::Sample(VcfError::InvalidFormat("x".to_string()));
        assert_eq!(sample.exit_code(), 3);

        assert_eq!(CliError::ExcessivePermutations.exit_code(), 4);
    }
}
