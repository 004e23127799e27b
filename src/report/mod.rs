//! Output assembly: per-gene serializable records and the outside-call
//! collaborator layer.

pub mod gene_call;
pub mod outside;

pub use gene_call::{CallSide, DiplotypeCall, GeneCall, VariantReport, Zygosity};
pub use outside::{
    check_collisions, parse_outside_calls, read_outside_calls, OutsideCall, OutsideCallError,
};
