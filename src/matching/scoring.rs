//! The ranking discipline, written out as plain comparator functions so the
//! output order is identical across platforms and runs.
//!
//! Matches order by: score descending, then allele names in natural order
//! (numeric runs compare numerically, so `*2` sorts before `*10`), reference
//! breaking exact-name ties, and off-reference partials after everything
//! else.

use std::cmp::Ordering;

use crate::matching::model::{BaseMatch, DiplotypeMatch};

/// Natural-order comparison of allele names: digit runs compare as numbers,
/// everything else byte-wise.
#[must_use]
pub fn compare_allele_names(a: &str, b: &str) -> Ordering {
    let mut ai = a.as_bytes();
    let mut bi = b.as_bytes();

    loop {
        match (ai.first(), bi.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&x), Some(&y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let (anum, arest) = take_number(ai);
                    let (bnum, brest) = take_number(bi);
                    match anum.cmp(&bnum) {
                        Ordering::Equal => {
                            ai = arest;
                            bi = brest;
                        }
                        other => return other,
                    }
                } else {
                    match x.cmp(&y) {
                        Ordering::Equal => {
                            ai = &ai[1..];
                            bi = &bi[1..];
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(bytes: &[u8]) -> (u64, &[u8]) {
    let end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    let mut value: u64 = 0;
    for &b in &bytes[..end] {
        value = value.saturating_mul(10).saturating_add(u64::from(b - b'0'));
    }
    (value, &bytes[end..])
}

/// Total order over strand candidates, ignoring score: off-reference
/// partials last, then component lists element-wise in natural name order
/// (reference first on equal names), shorter component lists first.
#[must_use]
pub fn compare_matches(a: &BaseMatch, b: &BaseMatch) -> Ordering {
    match (a.is_off_reference_partial(), b.is_off_reference_partial()) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        _ => {}
    }

    let a_names = a.component_names();
    let b_names = b.component_names();
    for (an, bn) in a_names.iter().zip(b_names.iter()) {
        match compare_allele_names(an, bn) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    match a_names.len().cmp(&b_names.len()) {
        Ordering::Equal => {}
        other => return other,
    }

    // identical component names: the reference-flagged side sorts first
    let a_ref = a.haplotype().reference;
    let b_ref = b.haplotype().reference;
    b_ref.cmp(&a_ref)
}

/// Total order over diplotype candidates: score descending, then the
/// ordered (left, right) sides under [`compare_matches`].
#[must_use]
pub fn compare_diplotypes(a: &DiplotypeMatch, b: &DiplotypeMatch) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| compare_matches(&a.left, &b.left))
        .then_with(|| compare_matches(&a.right, &b.right))
}

/// Put the two sides of an unphased diplotype into comparator order.
#[must_use]
pub fn order_sides(left: BaseMatch, right: BaseMatch) -> (BaseMatch, BaseMatch) {
    if compare_matches(&left, &right) == Ordering::Greater {
        (right, left)
    } else {
        (left, right)
    }
}
