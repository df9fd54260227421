#![allow(unused_imports)]

extern crate petrel_impute;

use approx::assert_relative_eq;

use petrel_impute::annotator::marker_annotation::{GenotypeStats, VcfAnnotations};

#[test]
fn test_monomorphic_marker_has_zero_r2() {
    let mut stats = GenotypeStats::new(2);
    for _ in 0..10 {
        stats.add_sample_gt_probs(&[1.0, 0.0, 0.0]);
    }
    assert_relative_eq!(stats.allele_freq(0), 1.0);
    assert_relative_eq!(stats.allele_freq(1), 0.0);
    assert_relative_eq!(stats.allelic_r2(), 0.0);
    assert_relative_eq!(stats.dose_r2(), 0.0);
    assert_relative_eq!(stats.hwe_dose_r2(), 0.0);
}

#[test]
fn test_uniform_uncertainty_zeroes_dose_r2() {
    // every sample at GP = (0.25, 0.5, 0.25): the expected dose is 1.0
    // with no variance across samples
    let mut stats = GenotypeStats::new(2);
    for _ in 0..8 {
        stats.add_sample_gt_probs(&[0.25, 0.5, 0.25]);
    }
    assert_relative_eq!(stats.allele_freq(1), 0.5);
    assert_relative_eq!(stats.dose_r2(), 0.0);
    assert_relative_eq!(stats.hwe_dose_r2(), 0.0);
}

#[test]
fn test_certain_calls_give_perfect_allelic_r2() {
    let mut stats = GenotypeStats::new(2);
    stats.add_sample_gt_probs(&[0.0, 1.0, 0.0]);
    stats.add_sample_gt_probs(&[1.0, 0.0, 0.0]);
    assert_relative_eq!(stats.allelic_r2(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(stats.dose_r2(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_unnormalized_genotype_probs_are_scaled() {
    let mut a = GenotypeStats::new(2);
    a.add_sample_gt_probs(&[2.0, 6.0, 2.0]);
    let mut b = GenotypeStats::new(2);
    b.add_sample_gt_probs(&[0.2, 0.6, 0.2]);
    assert_relative_eq!(a.allele_freq(1), b.allele_freq(1), epsilon = 1e-12);
}

#[test]
fn test_phased_allele_probs_match_genotype_probs() {
    // hap probabilities (1,0) x (0,1) describe a certain het
    let mut phased = GenotypeStats::new(2);
    phased.add_sample_allele_probs(&[1.0, 0.0], &[0.0, 1.0]);
    let mut unphased = GenotypeStats::new(2);
    unphased.add_sample_gt_probs(&[0.0, 1.0, 0.0]);
    assert_relative_eq!(
        phased.allele_freq(1),
        unphased.allele_freq(1),
        epsilon = 1e-12
    );
    assert_relative_eq!(phased.hwe_dose_r2(), unphased.hwe_dose_r2(), epsilon = 1e-12);
}

#[test]
fn test_all_zero_allele_probs_are_tolerated() {
    // zero rows occur at chromosome ends when no sequence passes the
    // projection threshold
    let mut stats = GenotypeStats::new(2);
    stats.add_sample_allele_probs(&[0.0, 0.0], &[0.0, 0.0]);
    assert_relative_eq!(stats.allele_freq(1), 0.0);
    assert_relative_eq!(stats.allelic_r2(), 0.0);
}

#[test]
fn test_multiallelic_reduction_buckets_non_ref_alleles() {
    // a certain (1,2) genotype is pure ALT: dose 2, no het mass
    let mut stats = GenotypeStats::new(3);
    let mut gt_probs = vec![0.0; 6];
    gt_probs[2 * 3 / 2 + 1] = 1.0; // index of genotype (1,2)
    stats.add_sample_gt_probs(&gt_probs);
    assert_relative_eq!(stats.allele_freq(0), 0.0);
    assert_relative_eq!(stats.allele_freq(1), 0.5);
    assert_relative_eq!(stats.allele_freq(2), 0.5);
}

#[test]
fn test_annotation_keys() {
    assert_eq!(VcfAnnotations::AlleleFrequency.to_key(), "AF");
    assert_eq!(VcfAnnotations::AllelicR2.to_key(), "AR2");
    assert_eq!(VcfAnnotations::DoseR2.to_key(), "DR2");
    assert_eq!(VcfAnnotations::Genotype.to_key(), "GT");
    assert_eq!(VcfAnnotations::Dose.to_key(), "DS");
    assert_eq!(VcfAnnotations::GenotypeProbs.to_key(), "GP");
    assert!(VcfAnnotations::AllelicR2.header_line().starts_with("##INFO"));
    assert!(VcfAnnotations::Dose.header_line().starts_with("##FORMAT"));
}
