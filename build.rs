use std::path::Path;

fn main() {
    let catalog_path = Path::new("definitions/alleles.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the definition catalog before building.\n",
        catalog_path.display()
    );

    // Read catalog file
    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    // Parse and validate JSON
    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_catalog_structure(&catalog);
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {catalog}\n"
    );

    let genes = catalog.get("genes").unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Missing 'genes' field\n\
             The catalog must have a top-level 'genes' array.\n"
        );
    });

    let genes = genes.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: 'genes' must be an array\n\
             Got: {genes}\n"
        );
    });

    let total_alleles = validate_genes(genes);

    println!(
        "cargo:warning=Validated definition catalog: {} genes, {total_alleles} named alleles",
        genes.len()
    );
}

fn validate_genes(genes: &[serde_json::Value]) -> usize {
    let mut total_alleles = 0;

    for (i, gene) in genes.iter().enumerate() {
        let symbol = gene
            .get("gene")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");

        let loci = gene
            .get("loci")
            .and_then(|v| v.as_array())
            .unwrap_or_else(|| {
                panic!("\n\nCATALOG BUILD ERROR: Gene '{symbol}' (index {i}) missing 'loci' array\n")
            });
        assert!(
            !loci.is_empty(),
            "\n\nCATALOG BUILD ERROR: Gene '{symbol}' defines no positions\n"
        );
        validate_loci(loci, symbol);

        let alleles = gene
            .get("alleles")
            .and_then(|v| v.as_array())
            .unwrap_or_else(|| {
                panic!(
                    "\n\nCATALOG BUILD ERROR: Gene '{symbol}' (index {i}) missing 'alleles' array\n"
                )
            });
        validate_alleles(alleles, loci.len(), symbol);
        total_alleles += alleles.len();
    }

    total_alleles
}

fn validate_loci(loci: &[serde_json::Value], symbol: &str) {
    let mut previous: Option<u64> = None;
    for (j, locus) in loci.iter().enumerate() {
        let position = locus
            .get("position")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or_else(|| {
                panic!(
                    "\n\nCATALOG BUILD ERROR: Gene '{symbol}' locus {j} missing numeric 'position'\n"
                )
            });
        assert!(
            locus.get("ref_allele").and_then(|v| v.as_str()).is_some(),
            "\n\nCATALOG BUILD ERROR: Gene '{symbol}' locus {j} missing 'ref_allele'\n"
        );
        if let Some(prev) = previous {
            assert!(
                position > prev,
                "\n\nCATALOG BUILD ERROR: Gene '{symbol}' positions not strictly ascending at {position}\n"
            );
        }
        previous = Some(position);
    }
}

fn validate_alleles(alleles: &[serde_json::Value], locus_count: usize, symbol: &str) {
    let mut reference_count = 0;
    for allele in alleles {
        let name = allele
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");

        let codes = allele
            .get("alleles")
            .and_then(|v| v.as_array())
            .unwrap_or_else(|| {
                panic!(
                    "\n\nCATALOG BUILD ERROR: Allele '{symbol}{name}' missing 'alleles' array\n"
                )
            });
        assert!(
            codes.len() == locus_count,
            "\n\nCATALOG BUILD ERROR: Allele '{symbol} {name}' has {} codes for {locus_count} positions\n",
            codes.len()
        );

        let is_reference = allele
            .get("reference")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if is_reference {
            reference_count += 1;
            assert!(
                codes.iter().all(|c| !c.is_null()),
                "\n\nCATALOG BUILD ERROR: Reference allele '{symbol} {name}' leaves positions unspecified\n"
            );
        }
    }
    assert!(
        reference_count == 1,
        "\n\nCATALOG BUILD ERROR: Gene '{symbol}' has {reference_count} reference alleles, expected exactly 1\n"
    );
}

fn set_build_dependencies() {
    // Tell cargo to rerun if the catalog changes
    println!("cargo:rerun-if-changed=definitions/alleles.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
