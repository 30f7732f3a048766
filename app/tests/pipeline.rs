// ==============================================================================
// tests/pipeline.rs - End-to-End Annotation Tests
// ==============================================================================
// Description: Drives AnnotationProcessor over temporary inputs, databases and
//              a stand-in ANNOVAR script
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use varied::{AnnotationProcessor, AnnovarOutcome, Config};

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("out")).unwrap();
        Self { root }
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.root.path().join(rel)
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn processor(&self, config: &str) -> AnnotationProcessor {
        let config = Config::parse(config).unwrap();
        AnnotationProcessor::new(Arc::new(config), self.path("out"))
    }

    fn output(&self, stem: &str) -> Vec<Vec<String>> {
        let text = fs::read_to_string(self.path(&format!("out/{}_varied.tsv", stem))).unwrap();
        text.lines()
            .map(|line| line.split('\t').map(str::to_string).collect())
            .collect()
    }
}

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

#[tokio::test]
async fn test_frequency_scenario() {
    let fx = Fixture::new();
    fx.write("calls.tsv", "chr1\t100\tA\tT\nchr1\t150\tG\tC\n");
    fx.write("db/1000G/1", "1\t100\tA\tT\t0.9\t0.1\n");

    let config = format!(
        "[[databases.allele_freq]]\nname = \"1000G\"\ninclude = true\ndb_path = \"{}\"\npopulations = [\"ALL\"]\n",
        toml_path(&fx.path("db/1000G"))
    );
    let report = fx.processor(&config).process(&fx.path("calls.tsv")).await.unwrap();
    assert_eq!(report.variants, 2);

    let rows = fx.output("calls");
    assert_eq!(rows[0], ["chromosome", "position", "ref", "alt", "1000G_ALL_Ref", "1000G_ALL_Alt"]);
    assert_eq!(rows[1], ["1", "100", "A", "T", "0.9", "0.1"]);
    assert_eq!(rows[2], ["1", "150", "G", "C", ".", "."]);
}

#[tokio::test]
async fn test_sources_in_fixed_order_with_uniform_width() {
    let fx = Fixture::new();
    fx.write(
        "calls.tsv",
        "chr1\t100\tA\tT\nchr2\t200\tC\tG\nCHR1\t100\tA\tT\nchrX\t5\tG\tA\n",
    );
    fx.write("db/freq/1", "1\t100\tA\tT\t0.9\t0.1\t0.7\t0.3\n");
    fx.write("db/freq/2", "2\t200\tC\tG\t0.6\t0.4\t0.5\t0.5\n");
    fx.write("db/dbsnp/X", "X\t5\tG\tA\trs42\n");
    fx.write("db/clinvar/.keep", "");

    let config = format!(
        r#"
[[databases.annotation]]
name = "dbSNP"
include = true
db_path = "{dbsnp}"

[[databases.annotation]]
name = "ClinVar"
include = true
db_path = "{clinvar}"

[[databases.allele_freq]]
name = "gnomAD"
include = true
db_path = "{freq}"
populations = ["ALL", "AFR"]

[[databases.allele_freq]]
name = "skipped"
include = false
db_path = "/does/not/exist"
populations = ["ALL"]
"#,
        dbsnp = toml_path(&fx.path("db/dbsnp")),
        clinvar = toml_path(&fx.path("db/clinvar")),
        freq = toml_path(&fx.path("db/freq")),
    );

    fx.processor(&config).process(&fx.path("calls.tsv")).await.unwrap();
    let rows = fx.output("calls");

    assert_eq!(
        rows[0],
        [
            "chromosome", "position", "ref", "alt",
            "gnomAD_ALL_Ref", "gnomAD_ALL_Alt", "gnomAD_AFR_Ref", "gnomAD_AFR_Alt",
            "dbSNP", "ClinVar",
        ]
    );
    for row in &rows {
        assert_eq!(row.len(), rows[0].len());
    }
    // duplicate keys share values
    assert_eq!(rows[1][4..], rows[3][4..]);
    assert_eq!(rows[1][4..], ["0.9", "0.1", "0.7", "0.3", ".", "."]);
    assert_eq!(rows[2][4..], ["0.6", "0.4", "0.5", "0.5", ".", "."]);
    assert_eq!(rows[4][4..], [".", ".", ".", ".", "rs42", "."]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_annovar_runs_before_databases() {
    let fx = Fixture::new();
    fx.write("calls.tsv", "chr1\t100\tA\tT\nchr1\t150\tG\tC\n");
    fx.write("db/dbsnp/1", "1\t150\tG\tC\trs7\n");
    fx.write(
        "annovar/table_annovar.pl",
        "out=\"\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--outfile\" ]; then out=\"$2\"; fi\n  shift\ndone\n\
printf 'Chr\\tStart\\tEnd\\tRef\\tAlt\\tFunc.refGene\\n1\\t100\\t100\\tA\\tT\\texonic\\n' > \"$out.hg19_multianno.txt\"\n",
    );

    let config = format!(
        r#"
[common]
threads = 2

[tools.annovar]
include = true
tool_path = "{tool}"
humandb_path = "/opt/humandb"
buildver = "hg19"
gene_based_annotation = ["refGene"]
interpreter = "sh"
timeout_secs = 30

[[databases.annotation]]
name = "dbSNP"
include = true
db_path = "{dbsnp}"
"#,
        tool = toml_path(&fx.path("annovar")),
        dbsnp = toml_path(&fx.path("db/dbsnp")),
    );

    let report = fx.processor(&config).process(&fx.path("calls.tsv")).await.unwrap();
    assert!(matches!(report.annovar, AnnovarOutcome::Applied(_)));

    let rows = fx.output("calls");
    assert_eq!(rows[0], ["chromosome", "position", "ref", "alt", "Func.refGene", "dbSNP"]);
    assert_eq!(rows[1], ["1", "100", "A", "T", "exonic", "."]);
    assert_eq!(rows[2], ["1", "150", "G", "C", ".", "rs7"]);
    assert!(fx.path("out/calls.avinput").exists());
}

#[tokio::test]
async fn test_empty_input_writes_header_only() {
    let fx = Fixture::new();
    fx.write("empty.tsv", "");
    fx.write("db/dbsnp/.keep", "");

    let config = format!(
        "[[databases.annotation]]\nname = \"dbSNP\"\ninclude = true\ndb_path = \"{}\"\n",
        toml_path(&fx.path("db/dbsnp"))
    );
    let report = fx.processor(&config).process(&fx.path("empty.tsv")).await.unwrap();

    assert_eq!(report.variants, 0);
    assert_eq!(fx.output("empty"), vec![vec!["chromosome", "position", "ref", "alt", "dbSNP"]]);
}
