//! Outside allele calls: diplotypes supplied by an external caller rather
//! than derived from sample data.
//!
//! The matcher never consumes these. The only interaction is the collision
//! check: a gene may be called from sample data or from an outside source,
//! never both.

use std::path::Path;

use thiserror::Error;

use crate::report::gene_call::GeneCall;

#[derive(Error, Debug)]
pub enum OutsideCallError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid outside call at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },

    #[error("Cannot specify outside call for {gene}, it is already called in sample data")]
    Collision { gene: String },
}

/// A gene call supplied from outside the sample, e.g. `CYP2D6<TAB>*1/*4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutsideCall {
    pub gene: String,
    pub diplotype: String,
}

/// Parse the two-column outside-call TSV. `#`-prefixed lines and blank
/// lines are ignored.
///
/// # Errors
///
/// Returns [`OutsideCallError::InvalidFormat`] for rows without exactly two
/// non-empty columns.
pub fn parse_outside_calls(text: &str) -> Result<Vec<OutsideCall>, OutsideCallError> {
    let mut calls = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let gene = fields.next().unwrap_or_default().trim();
        let diplotype = fields.next().unwrap_or_default().trim();
        if gene.is_empty() || diplotype.is_empty() || fields.next().is_some() {
            return Err(OutsideCallError::InvalidFormat {
                line: line_no,
                reason: "expected GENE<TAB>DIPLOTYPE".to_string(),
            });
        }

        calls.push(OutsideCall {
            gene: gene.to_string(),
            diplotype: diplotype.to_string(),
        });
    }
    Ok(calls)
}

/// Read outside calls from a file.
///
/// # Errors
///
/// See [`parse_outside_calls`].
pub fn read_outside_calls(path: &Path) -> Result<Vec<OutsideCall>, OutsideCallError> {
    let text = std::fs::read_to_string(path)?;
    parse_outside_calls(&text)
}

/// Reject outside calls for genes the matcher already called from sample
/// data. Matcher output is never modified.
///
/// # Errors
///
/// Returns [`OutsideCallError::Collision`] naming the first offending gene.
pub fn check_collisions(
    matched: &[GeneCall],
    outside: &[OutsideCall],
) -> Result<(), OutsideCallError> {
    for call in outside {
        if matched.iter().any(|g| g.called && g.gene == call.gene) {
            return Err(OutsideCallError::Collision {
                gene: call.gene.clone(),
            });
        }
    }
    Ok(())
}
