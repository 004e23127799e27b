use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::definition::gene::GeneDefinition;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Malformed catalog: {detail}")]
    MalformedCatalog { detail: String },
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    pub created_at: String,
    pub genes: Vec<GeneDefinition>,
}

/// The loaded allele-definition catalog with lookup indexes.
///
/// Read-only after load: gene tasks share it by reference.
#[derive(Debug)]
pub struct DefinitionCatalog {
    /// All gene definitions, alleles initialized
    pub genes: Vec<GeneDefinition>,

    /// Index: gene symbol -> index in genes vec
    symbol_to_index: HashMap<String, usize>,

    /// Index: (chromosome, position) -> indices of genes defined over it
    position_to_genes: HashMap<(String, u64), Vec<usize>>,
}

impl DefinitionCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            genes: Vec::new(),
            symbol_to_index: HashMap::new(),
            position_to_genes: HashMap::new(),
        }
    }

    /// Load the bundled demonstration catalog
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the embedded catalog fails validation;
    /// `build.rs` checks the same invariants at compile time, so this only
    /// fires when the two fall out of sync.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Embedded at compile time; validated by build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../definitions/alleles.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load a catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on I/O failure, invalid JSON, or a
    /// definition that violates catalog invariants.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a catalog from a JSON string
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on invalid JSON or definition invariant
    /// violations (misaligned vectors, missing reference allele, unsorted
    /// positions).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            tracing::warn!(
                "Catalog version mismatch (expected {}, found {})",
                CATALOG_VERSION,
                data.version
            );
        }

        let mut catalog = Self::new();
        for mut gene in data.genes {
            gene.initialize()?;
            catalog.add_gene(gene);
        }

        Ok(catalog)
    }

    /// Add an initialized gene definition to the catalog
    pub fn add_gene(&mut self, gene: GeneDefinition) {
        let index = self.genes.len();

        self.symbol_to_index.insert(gene.gene.clone(), index);
        for locus in &gene.loci {
            self.position_to_genes
                .entry(locus.key())
                .or_default()
                .push(index);
        }

        self.genes.push(gene);
    }

    /// Get a gene definition by symbol
    #[must_use]
    pub fn get(&self, gene: &str) -> Option<&GeneDefinition> {
        self.symbol_to_index.get(gene).map(|&idx| &self.genes[idx])
    }

    /// Is this (chromosome, position) a catalog position for any gene?
    #[must_use]
    pub fn contains_position(&self, chromosome: &str, position: u64) -> bool {
        self.position_to_genes
            .contains_key(&(chromosome.to_string(), position))
    }

    /// Export catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParseError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            genes: self.genes.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of genes in the catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Check if catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

impl Default for DefinitionCatalog {
    fn default() -> Self {
        Self::new()
    }
}
