use std::path::PathBuf;

use clap::Args;

use crate::cli::{CliError, OutputFormat};
use crate::definition::DefinitionCatalog;
use crate::matching::{call_all, MatcherConfig, WarningCode, DEFAULT_PERMUTATION_CAP};
use crate::report::{check_collisions, read_outside_calls, GeneCall};
use crate::sample::read_sample_file;

#[derive(Args)]
pub struct CallArgs {
    /// Sample VCF file (plain text or gzipped)
    #[arg(required = true)]
    pub vcf: PathBuf,

    /// Path to a custom definition catalog (JSON); the bundled catalog is
    /// used otherwise
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Outside-call TSV (GENE<TAB>DIPLOTYPE); rejected when a gene is also
    /// called from sample data
    #[arg(long)]
    pub outside_calls: Option<PathBuf>,

    /// Synthesize combination alleles unconditionally instead of only when
    /// no straight diplotype matches
    #[arg(long)]
    pub combinations: bool,

    /// Report every candidate diplotype instead of only the top-score tier
    #[arg(long)]
    pub all_matches: bool,

    /// Override the per-gene permutation cap
    #[arg(long, default_value_t = DEFAULT_PERMUTATION_CAP)]
    pub max_permutations: usize,
}

/// Execute the call subcommand.
///
/// # Errors
///
/// Returns [`CliError`] when the catalog or sample cannot be loaded, when an
/// outside call collides with a sample-data call, or when every covered gene
/// blew the permutation cap.
pub fn run(args: &CallArgs, format: OutputFormat, verbose: bool) -> Result<(), CliError> {
    let catalog = if let Some(path) = &args.catalog {
        DefinitionCatalog::load_from_file(path)?
    } else {
        DefinitionCatalog::load_embedded()?
    };

    if verbose {
        eprintln!("Loaded catalog with {} genes", catalog.len());
    }

    let sample = read_sample_file(&args.vcf, &catalog)?;
    if verbose {
        eprintln!("Parsed {} calls at catalog positions", sample.len());
    }

    let config = MatcherConfig {
        top_match_only: !args.all_matches,
        find_combinations: args.combinations,
        permutation_cap: args.max_permutations,
    };
    let results = call_all(&catalog, &sample, &config);

    let reports: Vec<GeneCall> = results
        .iter()
        .filter_map(|result| {
            catalog
                .get(&result.gene)
                .map(|gene| GeneCall::from_result(result, gene))
        })
        .collect();

    if let Some(path) = &args.outside_calls {
        let outside = read_outside_calls(path)?;
        check_collisions(&reports, &outside)?;
        if verbose {
            eprintln!("Accepted {} outside calls", outside.len());
        }
    }

    // The run as a whole failed only if permutation explosions left nothing
    // callable at all.
    let exploded = reports
        .iter()
        .any(|r| r.warnings.iter().any(|w| w.code == WarningCode::ExcessivePermutations));
    if exploded && reports.iter().all(|r| !r.called) {
        return Err(CliError::ExcessivePermutations);
    }

    match format {
        OutputFormat::Text => print_text_results(&reports, verbose),
        OutputFormat::Json => print_json_results(&reports)?,
        OutputFormat::Tsv => print_tsv_results(&reports),
    }

    Ok(())
}

fn print_text_results(reports: &[GeneCall], verbose: bool) {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }

        let status = if report.called { "CALLED" } else { "NOT CALLED" };
        let phasing = if report.phased { "phased" } else { "unphased" };
        println!("\n{} ({status}, {phasing})", report.gene);

        if !report.diplotypes.is_empty() {
            println!("\n   Diplotypes:");
            for dip in &report.diplotypes {
                println!("   - {}  (score {})", dip.display(), dip.score);
            }
        }
        if !report.combinations.is_empty() {
            println!("\n   Combination diplotypes:");
            for dip in &report.combinations {
                println!("   - {}  (score {})", dip.display(), dip.score);
            }
        }

        if verbose || !report.called {
            println!("\n   Variants:");
            for v in &report.variants {
                let rsid = v.rsid.as_deref().unwrap_or(".");
                let call = v.call.as_deref().unwrap_or("missing");
                let mut flags = String::new();
                if v.mismatch {
                    flags.push_str("  [off-catalog allele]");
                }
                println!("   - {}  {rsid}  {call}{flags}", v.position);
            }
        }

        if !report.warnings.is_empty() {
            println!("\n   Warnings:");
            for w in &report.warnings {
                println!("   - {}", w.message);
            }
        }
    }

    println!();
}

fn print_json_results(reports: &[GeneCall]) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}

fn print_tsv_results(reports: &[GeneCall]) {
    println!("gene\tcalled\tphased\trank\tlist\tdiplotype\tscore");
    for report in reports {
        if !report.called {
            println!(
                "{}\t{}\t{}\t.\t.\t.\t.",
                report.gene, report.called, report.phased
            );
            continue;
        }
        for (rank, dip) in report.diplotypes.iter().enumerate() {
            println!(
                "{}\t{}\t{}\t{}\thaplotype\t{}\t{}",
                report.gene,
                report.called,
                report.phased,
                rank + 1,
                dip.display(),
                dip.score
            );
        }
        for (rank, dip) in report.combinations.iter().enumerate() {
            println!(
                "{}\t{}\t{}\t{}\tcombination\t{}\t{}",
                report.gene,
                report.called,
                report.phased,
                rank + 1,
                dip.display(),
                dip.score
            );
        }
    }
}
