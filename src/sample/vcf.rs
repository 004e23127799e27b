//! Reader for sample variant records in VCF text form.
//!
//! Only records at catalog positions are consumed; everything else is
//! skipped. Each consumed record is normalized to a
//! [`SampleAllele`](crate::sample::SampleAllele): two literal allele strings
//! resolved from the GT field, plus a phased flag.
//!
//! Parsing is line-oriented text handling; the reader needs the genotype
//! column of the first sample and nothing else from the format machinery.

use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::definition::DefinitionCatalog;
use crate::sample::genotype::{SampleAllele, SampleData};

#[derive(Error, Debug)]
pub enum VcfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid VCF format: {0}")]
    InvalidFormat(String),

    #[error("Malformed variant at line {line}: {reason}")]
    MalformedVariant { line: usize, reason: String },

    #[error("Conflicting records at {chromosome}:{position}")]
    AmbiguousLocus { chromosome: String, position: u64 },
}

/// Read a sample VCF (plain text or gzipped), keeping only records at
/// catalog positions.
///
/// # Errors
///
/// Returns [`VcfError`] on I/O failure, structurally invalid records at
/// catalog positions, or two records that disagree at the same position.
pub fn read_sample_file(path: &Path, catalog: &DefinitionCatalog) -> Result<SampleData, VcfError> {
    let bytes = std::fs::read(path)?;
    let text = if path.to_string_lossy().ends_with(".gz") {
        let mut decoder = flate2::read::MultiGzDecoder::new(bytes.as_slice());
        let mut out = String::new();
        decoder.read_to_string(&mut out)?;
        out
    } else {
        String::from_utf8(bytes)
            .map_err(|e| VcfError::InvalidFormat(format!("not UTF-8 text: {e}")))?
    };
    read_sample_text(&text, catalog)
}

/// Parse sample VCF text, keeping only records at catalog positions.
///
/// # Errors
///
/// See [`read_sample_file`].
pub fn read_sample_text(text: &str, catalog: &DefinitionCatalog) -> Result<SampleData, VcfError> {
    let mut data = SampleData::new();
    let mut saw_header = false;

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        if line.starts_with("##") || line.is_empty() {
            continue;
        }
        if line.starts_with("#CHROM") {
            saw_header = true;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 10 {
            return Err(VcfError::MalformedVariant {
                line: line_no,
                reason: format!("expected at least 10 columns, found {}", fields.len()),
            });
        }

        let chromosome = fields[0];
        let position: u64 = fields[1].parse().map_err(|_| VcfError::MalformedVariant {
            line: line_no,
            reason: format!("invalid position '{}'", fields[1]),
        })?;

        if !catalog.contains_position(chromosome, position) {
            debug!("skipping non-catalog position {chromosome}:{position}");
            continue;
        }

        let Some(allele) = parse_record(&fields, line_no, chromosome, position)? else {
            // no usable call; the position stays missing
            continue;
        };
        if !data.insert(allele) {
            return Err(VcfError::AmbiguousLocus {
                chromosome: chromosome.to_string(),
                position,
            });
        }
    }

    if !saw_header && data.is_empty() {
        return Err(VcfError::InvalidFormat(
            "no #CHROM header line and no records found".to_string(),
        ));
    }
    Ok(data)
}

/// Normalize one record to a `SampleAllele`, or `None` when the genotype is
/// uncalled (`.` on either strand).
fn parse_record(
    fields: &[&str],
    line_no: usize,
    chromosome: &str,
    position: u64,
) -> Result<Option<SampleAllele>, VcfError> {
    let ref_allele = fields[3].to_uppercase();
    let alt_field = fields[4];

    if ref_allele.is_empty() || ref_allele == "." {
        return Err(VcfError::MalformedVariant {
            line: line_no,
            reason: "missing REF allele".to_string(),
        });
    }

    // REF is index 0; ALTs follow in order
    let mut alleles: Vec<String> = vec![ref_allele];
    if alt_field != "." {
        alleles.extend(alt_field.split(',').map(str::to_uppercase));
    }

    let format = fields[8];
    let gt_index = format
        .split(':')
        .position(|k| k == "GT")
        .ok_or_else(|| VcfError::MalformedVariant {
            line: line_no,
            reason: format!("no GT key in FORMAT '{format}'"),
        })?;
    let sample = fields[9];
    let gt = sample
        .split(':')
        .nth(gt_index)
        .ok_or_else(|| VcfError::MalformedVariant {
            line: line_no,
            reason: format!("sample column '{sample}' is missing the GT field"),
        })?;

    let phased = gt.contains('|');
    let calls: Vec<&str> = gt.split(['/', '|']).collect();
    if calls.len() != 2 {
        return Err(VcfError::MalformedVariant {
            line: line_no,
            reason: format!("expected a diploid genotype, found '{gt}'"),
        });
    }

    // A half-missing call gives us no usable strand assignment; treat the
    // whole position as missing.
    if calls.iter().any(|c| *c == ".") {
        warn!("uncalled genotype '{gt}' at {chromosome}:{position}, position treated as missing");
        return Ok(None);
    }

    let mut resolved = Vec::with_capacity(2);
    for call in calls {
        let idx: usize = call.parse().map_err(|_| VcfError::MalformedVariant {
            line: line_no,
            reason: format!("invalid GT index '{call}'"),
        })?;
        let allele = alleles.get(idx).ok_or_else(|| VcfError::MalformedVariant {
            line: line_no,
            reason: format!("GT index {idx} out of range for {} alleles", alleles.len()),
        })?;
        resolved.push(allele.clone());
    }

    Ok(Some(SampleAllele {
        chromosome: chromosome.to_string(),
        position,
        allele1: resolved[0].clone(),
        allele2: resolved[1].clone(),
        phased,
    }))
}
