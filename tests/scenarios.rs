//! End-to-end calling scenarios driven through the public API: bundled
//! catalog, VCF text in, per-gene reports out.

use haplomatch::matching::{call_all, MatcherConfig, MatcherEngine, WarningCode};
use haplomatch::report::{check_collisions, parse_outside_calls, GeneCall};
use haplomatch::sample::read_sample_text;
use haplomatch::DefinitionCatalog;

const HEADER: &str =
    "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n";

fn record(chrom: &str, pos: u64, r: &str, a: &str, gt: &str) -> String {
    format!("{chrom}\t{pos}\t.\t{r}\t{a}\t.\tPASS\t.\tGT\t{gt}\n")
}

fn vcf(records: &[String]) -> String {
    format!("{HEADER}{}", records.concat())
}

fn call_gene(vcf_text: &str, gene: &str, config: MatcherConfig) -> GeneCall {
    let catalog = DefinitionCatalog::load_embedded().unwrap();
    let sample = read_sample_text(vcf_text, &catalog).unwrap();
    let engine = MatcherEngine::with_config(&catalog, config);
    let definition = catalog.get(gene).unwrap();
    let result = engine.call_gene(definition, &sample);
    GeneCall::from_result(&result, definition)
}

fn diplotype_names(report: &GeneCall) -> Vec<String> {
    report.diplotypes.iter().map(|d| d.display()).collect()
}

fn combination_names(report: &GeneCall) -> Vec<String> {
    report.combinations.iter().map(|d| d.display()).collect()
}

#[test]
fn cyp2c19_homozygous_reference() {
    let vcf = vcf(&[
        record("chr10", 94761900, "C", ".", "0/0"),
        record("chr10", 94762706, "A", ".", "0/0"),
        record("chr10", 94781859, "G", ".", "0/0"),
    ]);
    let report = call_gene(&vcf, "CYP2C19", MatcherConfig::default());

    assert!(report.called);
    // homozygous-only samples are effectively phased
    assert!(report.phased);
    assert_eq!(diplotype_names(&report), vec!["*1/*1"]);
    assert_eq!(report.diplotypes[0].score, 6);
    assert!(report.warnings.is_empty());
}

#[test]
fn cyp2c19_star1_star2_het() {
    let vcf = vcf(&[
        record("chr10", 94761900, "C", ".", "0/0"),
        record("chr10", 94762706, "A", ".", "0/0"),
        record("chr10", 94781859, "G", "A", "0/1"),
    ]);
    let report = call_gene(&vcf, "CYP2C19", MatcherConfig::default());

    assert!(report.called);
    assert!(!report.phased);
    assert_eq!(diplotype_names(&report), vec!["*1/*2"]);

    let rs4244285 = report
        .variants
        .iter()
        .find(|v| v.rsid.as_deref() == Some("rs4244285"))
        .unwrap();
    assert_eq!(rs4244285.call.as_deref(), Some("G/A"));
    assert!(!rs4244285.missing);
}

#[test]
fn cyp2c19_missing_position_ties() {
    // homozygous *17/*4 marker at rs12248560, rs28399504 absent from the
    // sample: *4 and *17 become indistinguishable and every pairing ties
    let vcf = vcf(&[
        record("chr10", 94761900, "C", "T", "1/1"),
        record("chr10", 94781859, "G", ".", "0/0"),
    ]);
    let report = call_gene(&vcf, "CYP2C19", MatcherConfig::default());

    assert!(report.called);
    assert_eq!(
        diplotype_names(&report),
        vec!["*4/*4", "*4/*17", "*17/*17"]
    );
    assert!(report.diplotypes.iter().all(|d| d.score == 2));
    assert!(report
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::PositionMissing && w.position == Some(94762706)));

    let missing = report.variants.iter().find(|v| v.missing).unwrap();
    assert_eq!(missing.rsid.as_deref(), Some("rs28399504"));
}

#[test]
fn ugt1a1_combination_phased() {
    // *80 and *28 markers on the same strand
    let vcf = vcf(&[
        record("chr2", 233759924, "C", "T", "1|0"),
        record("chr2", 233760233, "CAT", "CATAT", "1|0"),
    ]);
    let config = MatcherConfig {
        find_combinations: true,
        ..MatcherConfig::default()
    };
    let report = call_gene(&vcf, "UGT1A1", config);

    assert!(report.called);
    assert!(report.phased);
    assert!(report.diplotypes.is_empty());
    assert_eq!(combination_names(&report), vec!["*1/*28 + *80"]);
    assert_eq!(report.combinations[0].score, 4);
}

#[test]
fn ugt1a1_combination_unphased() {
    // same sites without phase: no straight diplotype survives, both
    // markers report heterozygous
    let vcf = vcf(&[
        record("chr2", 233759924, "C", "T", "0/1"),
        record("chr2", 233760233, "CAT", "CATAT", "0/1"),
    ]);
    let config = MatcherConfig {
        find_combinations: true,
        ..MatcherConfig::default()
    };
    let report = call_gene(&vcf, "UGT1A1", config);

    assert!(!report.phased);
    assert!(report.diplotypes.is_empty());
    for variant in &report.variants {
        assert_eq!(
            variant.zygosity,
            Some(haplomatch::report::Zygosity::Heterozygous)
        );
    }
}

#[test]
fn cyp2b6_overlapping_calls_top_and_all_matches() {
    let records = [
        record("chr19", 41512841, "G", "T", "0/1"),
        record("chr19", 41515263, "A", "G", "0/1"),
    ];

    let top = call_gene(&vcf(&records), "CYP2B6", MatcherConfig::default());
    assert_eq!(diplotype_names(&top), vec!["*1/*34"]);

    let all = call_gene(
        &vcf(&records),
        "CYP2B6",
        MatcherConfig {
            top_match_only: false,
            ..MatcherConfig::default()
        },
    );
    let names = diplotype_names(&all);
    let rank_of = |name: &str| names.iter().position(|n| n == name).unwrap();
    assert!(rank_of("*1/*34") < rank_of("*33/*36"));

    let score_of = |name: &str| all.diplotypes[rank_of(name)].score;
    assert!(score_of("*1/*34") > score_of("*33/*36"));
}

#[test]
fn tpmt_off_reference_partial() {
    // A at rs1142345 disagrees with every TPMT allele code
    let vcf = vcf(&[
        record("chr6", 18130918, "T", "A", "0/1"),
        record("chr6", 18143724, "C", ".", "0/0"),
    ]);
    let report = call_gene(&vcf, "TPMT", MatcherConfig::default());

    assert!(report.diplotypes.is_empty());
    assert_eq!(combination_names(&report), vec!["*1/g.18130918T>A"]);

    let partial = &report.combinations[0].right;
    match partial {
        haplomatch::report::CallSide::OffReference { labels, name } => {
            assert_eq!(labels, &vec!["g.18130918T>A".to_string()]);
            assert_eq!(name, "g.18130918T>A");
        }
        other => panic!("expected off-reference side, got {other:?}"),
    }

    let mismatched = report.variants.iter().find(|v| v.mismatch).unwrap();
    assert_eq!(mismatched.rsid.as_deref(), Some("rs1142345"));
}

#[test]
fn outside_call_collision() {
    let vcf = vcf(&[
        record("chr10", 94761900, "C", ".", "0/0"),
        record("chr10", 94762706, "A", ".", "0/0"),
        record("chr10", 94781859, "G", ".", "0/0"),
    ]);
    let catalog = DefinitionCatalog::load_embedded().unwrap();
    let sample = read_sample_text(&vcf, &catalog).unwrap();
    let results = call_all(&catalog, &sample, &MatcherConfig::default());
    let reports: Vec<GeneCall> = results
        .iter()
        .map(|r| GeneCall::from_result(r, catalog.get(&r.gene).unwrap()))
        .collect();

    // CYP2C19 is called from sample data; an outside call for it collides
    let outside = parse_outside_calls("CYP2C19\t*1/*17\n").unwrap();
    assert!(check_collisions(&reports, &outside).is_err());

    // an outside call for an uncovered gene is fine
    let outside = parse_outside_calls("TPMT\t*1/*2\n").unwrap();
    assert!(check_collisions(&reports, &outside).is_ok());

    // and the matcher output itself is unchanged by the collision check
    assert_eq!(
        diplotype_names(reports.iter().find(|r| r.gene == "CYP2C19").unwrap()),
        vec!["*1/*1"]
    );
}

#[test]
fn no_coverage_leaves_gene_uncalled() {
    let catalog = DefinitionCatalog::load_embedded().unwrap();
    let sample = read_sample_text(HEADER, &catalog).unwrap();
    let results = call_all(&catalog, &sample, &MatcherConfig::default());

    for result in &results {
        assert!(!result.called());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::NoCoverage));
    }
}

#[test]
fn sample_iupac_expands_without_doubling() {
    // R at rs4244285 expands to {A, G}: two candidate diplotypes, not four
    let vcf = vcf(&[
        record("chr10", 94761900, "C", ".", "0/0"),
        record("chr10", 94762706, "A", ".", "0/0"),
        record("chr10", 94781859, "G", "R", "0/1"),
    ]);
    let report = call_gene(
        &vcf,
        "CYP2C19",
        MatcherConfig {
            top_match_only: false,
            ..MatcherConfig::default()
        },
    );

    assert_eq!(diplotype_names(&report), vec!["*1/*1", "*1/*2"]);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::AmbiguityExpanded));
}

#[test]
fn dropping_a_position_never_removes_a_wildcard_call() {
    // full data calls *17/*17; with rs28399504 dropped, *17/*17 must
    // still be present among the candidates
    let full = vcf(&[
        record("chr10", 94761900, "C", "T", "1/1"),
        record("chr10", 94762706, "A", ".", "0/0"),
        record("chr10", 94781859, "G", ".", "0/0"),
    ]);
    let report = call_gene(&full, "CYP2C19", MatcherConfig::default());
    assert_eq!(diplotype_names(&report), vec!["*17/*17"]);

    let dropped = vcf(&[
        record("chr10", 94761900, "C", "T", "1/1"),
        record("chr10", 94781859, "G", ".", "0/0"),
    ]);
    let report = call_gene(&dropped, "CYP2C19", MatcherConfig::default());
    assert!(diplotype_names(&report).contains(&"*17/*17".to_string()));
}

#[test]
fn output_is_deterministic() {
    let vcf = vcf(&[
        record("chr10", 94761900, "C", "T", "0/1"),
        record("chr10", 94762706, "A", ".", "0/0"),
        record("chr10", 94781859, "G", "A", "0/1"),
        record("chr19", 41512841, "G", "T", "0/1"),
        record("chr19", 41515263, "A", "G", "0/1"),
    ]);
    let catalog = DefinitionCatalog::load_embedded().unwrap();
    let config = MatcherConfig {
        top_match_only: false,
        find_combinations: true,
        ..MatcherConfig::default()
    };

    let serialize = || {
        let sample = read_sample_text(&vcf, &catalog).unwrap();
        let results = call_all(&catalog, &sample, &config);
        let reports: Vec<GeneCall> = results
            .iter()
            .map(|r| GeneCall::from_result(r, catalog.get(&r.gene).unwrap()))
            .collect();
        serde_json::to_string_pretty(&reports).unwrap()
    };

    assert_eq!(serialize(), serialize());
}

#[test]
fn custom_catalog_file_round_trip() {
    use std::io::Write;

    let catalog = DefinitionCatalog::load_embedded().unwrap();
    let json = catalog.to_json().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let reloaded = DefinitionCatalog::load_from_file(file.path()).unwrap();
    assert_eq!(reloaded.len(), catalog.len());
    assert!(reloaded.get("UGT1A1").is_some());
}
