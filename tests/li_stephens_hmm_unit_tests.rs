#![allow(unused_imports)]

extern crate petrel_impute;

use std::sync::Arc;

use approx::assert_relative_eq;

use petrel_impute::imputation::imputation_data::ImputationData;
use petrel_impute::imputation::li_stephens_hmm::LiStephensHmm;
use petrel_impute::model::genetic_map::UniformGeneticMap;
use petrel_impute::model::marker::Marker;
use petrel_impute::model::samples::Samples;
use petrel_impute::window::current_data::CurrentData;
use petrel_impute::window::emission::{MarkerEmission, TargetEmission};

const ERR_RATE: f64 = 1e-4;

struct LiStephensHmmUnitTest {
    chrom: Arc<String>,
}

impl LiStephensHmmUnitTest {
    fn new() -> Self {
        Self {
            chrom: Arc::new(String::from("chr20")),
        }
    }

    /// One emission per marker; `ref_haps` is indexed [hap][marker] and
    /// `target_haps` likewise, with None marking an ungenotyped marker.
    fn current_data(
        &self,
        positions: &[u64],
        ref_haps: &[Vec<u8>],
        target_haps: &[Vec<u8>],
        targeted: &[bool],
    ) -> CurrentData {
        assert_eq!(ref_haps.len() % 2, 0);
        assert_eq!(target_haps.len() % 2, 0);
        let ref_samples = Samples::new(
            (0..ref_haps.len() / 2)
                .map(|s| format!("ref{}", s + 1))
                .collect(),
        );
        let target_samples = Samples::new(
            (0..target_haps.len() / 2)
                .map(|s| format!("targ{}", s + 1))
                .collect(),
        );
        let emissions: Vec<MarkerEmission> = positions
            .iter()
            .enumerate()
            .map(|(m, &pos)| {
                let marker = Marker::new(
                    0,
                    self.chrom.clone(),
                    pos,
                    None,
                    vec![String::from("A"), String::from("G")],
                );
                let target = if targeted[m] {
                    Some(TargetEmission::PhasedGenotypes(
                        target_haps.iter().map(|h| h[m]).collect(),
                    ))
                } else {
                    None
                };
                MarkerEmission::new(marker, ref_haps.iter().map(|h| h[m]).collect(), target)
            })
            .collect();
        CurrentData::new(0, &emissions, &ref_samples, &target_samples, 0, 1, true).unwrap()
    }

    fn allele_prob(&self, cd: &CurrentData, probs: &[f32], marker: usize, allele: usize) -> f64 {
        probs[cd.markers().sum_alleles(marker) + allele] as f64
    }
}

#[test]
fn test_target_matching_reference_haplotype_recovers_it() {
    let fixture = LiStephensHmmUnitTest::new();
    let positions: Vec<u64> = (1..=5).map(|k| 1_000_000 * k).collect();
    let ref_haps = vec![
        vec![0, 0, 0, 0, 0],
        vec![1, 1, 1, 1, 1],
        vec![0, 1, 0, 1, 0],
        vec![1, 0, 1, 0, 1],
    ];
    // both target haplotypes copy reference haplotype 0
    let target_haps = vec![vec![0, 0, 0, 0, 0], vec![0, 0, 0, 0, 0]];
    let cd = fixture.current_data(&positions, &ref_haps, &target_haps, &[true; 5]);
    let map = UniformGeneticMap::new(1.0);
    let data = ImputationData::new(&cd, &map, 0.005, ERR_RATE, 100.0);
    assert_eq!(data.n_clusters(), 5);

    let mut hmm = LiStephensHmm::new(&data, false);
    let probs = hmm.impute(0);
    for m in 0..5 {
        assert!(
            fixture.allele_prob(&cd, &probs, m, 0) > 0.99,
            "Marker {} reference-haplotype allele probability too low: {}",
            m,
            fixture.allele_prob(&cd, &probs, m, 0)
        );
    }
}

#[test]
fn test_allele_probabilities_normalize_at_every_marker() {
    let fixture = LiStephensHmmUnitTest::new();
    let positions: Vec<u64> = (1..=5).map(|k| 1_000_000 * k).collect();
    let ref_haps = vec![
        vec![0, 0, 0, 0, 0],
        vec![1, 1, 1, 1, 1],
        vec![0, 1, 0, 1, 0],
        vec![1, 0, 1, 0, 1],
    ];
    // haplotype 1 is a single-crossover recombinant of the panel
    let target_haps = vec![vec![0, 0, 0, 0, 0], vec![0, 0, 1, 1, 1]];
    let cd = fixture.current_data(&positions, &ref_haps, &target_haps, &[true; 5]);
    let map = UniformGeneticMap::new(1.0);
    let data = ImputationData::new(&cd, &map, 0.005, ERR_RATE, 100.0);

    let mut hmm = LiStephensHmm::new(&data, false);
    for hap in 0..2 {
        let probs = hmm.impute(hap);
        for m in 0..5 {
            let sum: f64 = (0..2)
                .map(|a| fixture.allele_prob(&cd, &probs, m, a))
                .sum();
            assert!(
                (0.98..=1.0 + 1e-6).contains(&sum),
                "Marker {} allele probabilities sum to {}",
                m,
                sum
            );
        }
    }
}

#[test]
fn test_mismatch_against_uniform_panel_keeps_panel_allele() {
    // with every panel haplotype carrying the reference allele at the
    // mismatched marker, the projection has no sequence to put alternate
    // mass on; the emission error only rescales state probabilities
    let fixture = LiStephensHmmUnitTest::new();
    let positions: Vec<u64> = (1..=5).map(|k| 1_000_000 * k).collect();
    let ref_haps = vec![vec![0, 0, 0, 0, 0], vec![0, 0, 0, 0, 0]];
    let target_haps = vec![vec![0, 0, 1, 0, 0], vec![0, 0, 1, 0, 0]];
    let cd = fixture.current_data(&positions, &ref_haps, &target_haps, &[true; 5]);
    let map = UniformGeneticMap::new(1.0);
    let data = ImputationData::new(&cd, &map, 0.005, ERR_RATE, 100.0);

    let mut hmm = LiStephensHmm::new(&data, false);
    let probs = hmm.impute(0);
    assert_relative_eq!(fixture.allele_prob(&cd, &probs, 2, 0), 1.0, epsilon = 1e-6);
    assert_relative_eq!(fixture.allele_prob(&cd, &probs, 2, 1), 0.0, epsilon = 1e-6);
}

#[test]
fn test_mismatched_marker_resolves_to_matching_haplotypes() {
    // the panel carries both alleles at the middle marker; the target
    // matches the alternate-carrying pair exactly
    let fixture = LiStephensHmmUnitTest::new();
    let positions: Vec<u64> = (1..=5).map(|k| 1_000_000 * k).collect();
    let ref_haps = vec![
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 1, 0, 0],
        vec![0, 0, 1, 0, 0],
    ];
    let target_haps = vec![vec![0, 0, 1, 0, 0], vec![0, 0, 1, 0, 0]];
    let cd = fixture.current_data(&positions, &ref_haps, &target_haps, &[true; 5]);
    let map = UniformGeneticMap::new(1.0);
    let data = ImputationData::new(&cd, &map, 0.005, ERR_RATE, 100.0);

    let mut hmm = LiStephensHmm::new(&data, false);
    let probs = hmm.impute(0);
    assert!(fixture.allele_prob(&cd, &probs, 2, 1) > 0.9);
}

#[test]
fn test_interpolation_between_clusters() {
    let fixture = LiStephensHmmUnitTest::new();
    let positions: Vec<u64> = (1..=5).map(|k| 1_000_000 * k).collect();
    let ref_haps = vec![
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0],
        vec![1, 1, 1, 1, 1],
        vec![1, 1, 1, 1, 1],
    ];
    // markers 1 and 3 are not genotyped in the target; their
    // probabilities come from interpolation
    let target_haps = vec![vec![0, 0, 0, 0, 0], vec![0, 0, 0, 0, 0]];
    let targeted = [true, false, true, false, true];
    let cd = fixture.current_data(&positions, &ref_haps, &target_haps, &targeted);
    let map = UniformGeneticMap::new(1.0);
    let data = ImputationData::new(&cd, &map, 0.005, ERR_RATE, 100.0);
    assert_eq!(data.n_clusters(), 3);

    let mut hmm = LiStephensHmm::new(&data, false);
    let probs = hmm.impute(0);
    for m in 0..5 {
        assert!(
            fixture.allele_prob(&cd, &probs, m, 0) > 0.99,
            "Marker {} interpolated probability too low",
            m
        );
        let sum: f64 = (0..2)
            .map(|a| fixture.allele_prob(&cd, &probs, m, a))
            .sum();
        assert!((0.99..=1.0 + 1e-6).contains(&sum));
    }
}

#[test]
fn test_checkpointed_forward_buffer_matches_full_storage() {
    let fixture = LiStephensHmmUnitTest::new();
    let n_markers = 17;
    let positions: Vec<u64> = (1..=n_markers as u64).map(|k| 1_000_000 * k).collect();
    // six haplotypes with deterministic, distinct mosaics
    let ref_haps: Vec<Vec<u8>> = (0..6)
        .map(|h| {
            (0..n_markers)
                .map(|m| (((m * 7 + h * 3 + m * h) % 5) % 2) as u8)
                .collect()
        })
        .collect();
    let target_haps = vec![ref_haps[1].clone(), ref_haps[4].clone()];
    let cd = fixture.current_data(&positions, &ref_haps, &target_haps, &[true; 17]);
    let map = UniformGeneticMap::new(1.0);
    let data = ImputationData::new(&cd, &map, 0.005, ERR_RATE, 1000.0);
    assert_eq!(data.n_clusters(), n_markers);

    let mut full = LiStephensHmm::new(&data, false);
    let mut low_mem = LiStephensHmm::new(&data, true);
    for hap in 0..2 {
        let expected = full.impute(hap);
        let actual = low_mem.impute(hap);
        assert_eq!(
            expected, actual,
            "Checkpointed forward buffer changed haplotype {} output",
            hap
        );
    }
}
