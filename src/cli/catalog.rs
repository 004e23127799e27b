use std::path::PathBuf;

use clap::Args;

use crate::cli::{CliError, OutputFormat};
use crate::definition::{DefinitionCatalog, GeneDefinition};

#[derive(Args)]
pub struct CatalogArgs {
    /// Path to a custom definition catalog (JSON); the bundled catalog is
    /// used otherwise
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Show the full definition table for one gene
    #[arg(long, value_name = "GENE")]
    pub show: Option<String>,
}

/// Execute the catalog subcommand.
///
/// # Errors
///
/// Returns [`CliError::Catalog`] when the catalog cannot be loaded or the
/// requested gene does not exist.
pub fn run(args: &CatalogArgs, format: OutputFormat) -> Result<(), CliError> {
    let catalog = if let Some(path) = &args.catalog {
        DefinitionCatalog::load_from_file(path)?
    } else {
        DefinitionCatalog::load_embedded()?
    };

    match &args.show {
        Some(symbol) => {
            let gene = catalog.get(symbol).ok_or_else(|| {
                CliError::Catalog(crate::definition::CatalogError::MalformedCatalog {
                    detail: format!("no definition for gene {symbol}"),
                })
            })?;
            show_gene(gene, format)?;
        }
        None => list_genes(&catalog, format)?,
    }
    Ok(())
}

fn list_genes(catalog: &DefinitionCatalog, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            println!("{} genes:\n", catalog.len());
            for gene in &catalog.genes {
                println!(
                    "  {}  {} positions, {} named alleles (reference {})",
                    gene.gene,
                    gene.loci.len(),
                    gene.alleles.len(),
                    gene.reference_allele().name
                );
            }
        }
        OutputFormat::Json => {
            let summary: Vec<serde_json::Value> = catalog
                .genes
                .iter()
                .map(|g| {
                    serde_json::json!({
                        "gene": g.gene,
                        "chromosome": g.chromosome,
                        "positions": g.loci.len(),
                        "alleles": g.alleles.len(),
                        "reference": g.reference_allele().name,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Tsv => {
            println!("gene\tchromosome\tpositions\talleles\treference");
            for g in &catalog.genes {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    g.gene,
                    g.chromosome,
                    g.loci.len(),
                    g.alleles.len(),
                    g.reference_allele().name
                );
            }
        }
    }
    Ok(())
}

fn show_gene(gene: &GeneDefinition, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            println!("{} ({})\n", gene.gene, gene.chromosome);
            println!("Positions:");
            for locus in &gene.loci {
                println!(
                    "  {}  {}  {}>{}",
                    locus.position,
                    locus.rsid.as_deref().unwrap_or("."),
                    locus.ref_allele,
                    locus.alt_alleles.join(",")
                );
            }
            println!("\nAlleles:");
            for allele in &gene.alleles {
                let codes: Vec<&str> = allele
                    .alleles
                    .iter()
                    .map(|c| c.as_deref().unwrap_or("."))
                    .collect();
                let marker = if allele.reference { " (reference)" } else { "" };
                println!("  {}{}  [{}]", allele.name, marker, codes.join(" "));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(gene)?);
        }
        OutputFormat::Tsv => {
            let positions: Vec<String> =
                gene.loci.iter().map(|l| l.position.to_string()).collect();
            println!("allele\treference\t{}", positions.join("\t"));
            for allele in &gene.alleles {
                let codes: Vec<&str> = allele
                    .alleles
                    .iter()
                    .map(|c| c.as_deref().unwrap_or("."))
                    .collect();
                println!("{}\t{}\t{}", allele.name, allele.reference, codes.join("\t"));
            }
        }
    }
    Ok(())
}
