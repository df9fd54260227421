#![allow(unused_imports)]

extern crate petrel_impute;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use petrel_impute::model::genetic_map::UniformGeneticMap;
use petrel_impute::model::marker::Marker;
use petrel_impute::model::samples::Samples;
use petrel_impute::processing::imputation_engine::{start_imputation_engine, ImputationConfig};
use petrel_impute::window::emission::{MarkerEmission, TargetEmission, VecEmissionSource};

struct ImputationEngineUnitTest {
    chrom: Arc<String>,
    tmp: tempfile::TempDir,
}

impl ImputationEngineUnitTest {
    fn new() -> Self {
        Self {
            chrom: Arc::new(String::from("chr20")),
            tmp: tempfile::tempdir().expect("Unable to create temporary directory"),
        }
    }

    /// Five biallelic markers, four reference haplotypes, one target
    /// sample copying reference haplotype 0 on both haplotypes.
    fn source(&self) -> VecEmissionSource {
        let ref_haps: Vec<Vec<u8>> = vec![
            vec![0, 0, 0, 0, 0],
            vec![1, 1, 1, 1, 1],
            vec![0, 1, 0, 1, 0],
            vec![1, 0, 1, 0, 1],
        ];
        let emissions: Vec<MarkerEmission> = (0..5)
            .map(|m| {
                let marker = Marker::new(
                    0,
                    self.chrom.clone(),
                    1_000_000 * (m as u64 + 1),
                    Some(format!("rs{}", m + 1)),
                    vec![String::from("A"), String::from("G")],
                );
                MarkerEmission::new(
                    marker,
                    ref_haps.iter().map(|h| h[m]).collect(),
                    Some(TargetEmission::PhasedGenotypes(vec![0, 0])),
                )
            })
            .collect();
        VecEmissionSource::new(
            Samples::new(vec![String::from("r1"), String::from("r2")]),
            Samples::new(vec![String::from("t1")]),
            emissions,
        )
    }

    fn config(&self, name: &str) -> ImputationConfig {
        ImputationConfig {
            ne: 100.0,
            out_prefix: self.tmp.path().join(name),
            ..ImputationConfig::default()
        }
    }

    fn read_vcf(&self, name: &str) -> String {
        let mut path = self.tmp.path().join(name).into_os_string();
        path.push(".vcf");
        std::fs::read_to_string(path).expect("Unable to read VCF output")
    }
}

#[test]
fn test_imputation_recovers_copied_haplotype() {
    let fixture = ImputationEngineUnitTest::new();
    let map = UniformGeneticMap::new(1.0);
    let config = fixture.config("run");
    start_imputation_engine(fixture.source(), &map, &config, None).unwrap();

    let vcf = fixture.read_vcf("run");
    let records: Vec<&str> = vcf.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(records.len(), 5);
    for (m, record) in records.iter().enumerate() {
        let fields: Vec<&str> = record.split('\t').collect();
        assert_eq!(fields[1], format!("{}", 1_000_000 * (m + 1)));
        assert_eq!(fields[2], format!("rs{}", m + 1));
        assert_eq!(fields[6], "PASS");
        assert_eq!(fields[8], "GT:DS");
        // the target copies reference haplotype 0, so the phased call is
        // homozygous reference with a negligible alternate dose
        assert!(fields[9].starts_with("0|0:"), "Record: {}", record);
    }
}

#[test]
fn test_output_is_deterministic() {
    let fixture = ImputationEngineUnitTest::new();
    let map = UniformGeneticMap::new(1.0);

    let config_a = fixture.config("run_a");
    start_imputation_engine(fixture.source(), &map, &config_a, None).unwrap();
    let config_b = fixture.config("run_b");
    start_imputation_engine(fixture.source(), &map, &config_b, None).unwrap();

    assert_eq!(fixture.read_vcf("run_a"), fixture.read_vcf("run_b"));
}

#[test]
fn test_passthrough_writes_unphased_genotypes() {
    let fixture = ImputationEngineUnitTest::new();
    let map = UniformGeneticMap::new(1.0);
    let config = ImputationConfig {
        impute: false,
        ..fixture.config("passthrough")
    };
    start_imputation_engine(fixture.source(), &map, &config, None).unwrap();

    let vcf = fixture.read_vcf("passthrough");
    let records: Vec<&str> = vcf.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(records.len(), 5);
    for record in records {
        let fields: Vec<&str> = record.split('\t').collect();
        assert_eq!(fields[8], "GT:DS:GP");
        assert!(fields[9].starts_with("0/0:"), "Record: {}", record);
    }
}

#[test]
fn test_excluding_all_target_samples_is_config_error() {
    let fixture = ImputationEngineUnitTest::new();
    let map = UniformGeneticMap::new(1.0);
    let config = ImputationConfig {
        exclude_samples: HashSet::from([String::from("t1")]),
        ..fixture.config("excluded")
    };
    let result = start_imputation_engine(fixture.source(), &map, &config, None);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("No target samples"));
}
