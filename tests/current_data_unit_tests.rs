#![allow(unused_imports)]

extern crate petrel_impute;

use std::sync::Arc;

use petrel_impute::model::samples::Samples;
use petrel_impute::model::marker::Marker;
use petrel_impute::utils::errors::ImputationError;
use petrel_impute::window::current_data::CurrentData;
use petrel_impute::window::emission::{
    EmissionSource, MarkerEmission, TargetEmission, VecEmissionSource,
};
use petrel_impute::window::marker_window::MarkerWindowIterator;

struct CurrentDataUnitTest {
    chrom: Arc<String>,
    ref_samples: Samples,
    target_samples: Samples,
}

impl CurrentDataUnitTest {
    fn new() -> Self {
        Self {
            chrom: Arc::new(String::from("chr20")),
            ref_samples: Samples::new(vec![String::from("ref1"), String::from("ref2")]),
            target_samples: Samples::new(vec![String::from("targ1")]),
        }
    }

    fn emission(&self, pos: u64, ref_alleles: Vec<u8>, targeted: bool) -> MarkerEmission {
        let marker = Marker::new(
            0,
            self.chrom.clone(),
            pos,
            None,
            vec![String::from("A"), String::from("G")],
        );
        let target = if targeted {
            Some(TargetEmission::PhasedGenotypes(vec![0, 1]))
        } else {
            None
        };
        MarkerEmission::new(marker, ref_alleles, target)
    }

    fn uniform_emissions(&self, positions: &[u64]) -> Vec<MarkerEmission> {
        positions
            .iter()
            .map(|&p| self.emission(p, vec![0, 1, 0, 1], true))
            .collect()
    }
}

#[test]
fn test_splice_partition_covers_markers_once() {
    let fixture = CurrentDataUnitTest::new();
    let positions: Vec<u64> = (1..=10).map(|k| 100 * k).collect();
    let source = VecEmissionSource::new(
        fixture.ref_samples.clone(),
        fixture.target_samples.clone(),
        fixture.uniform_emissions(&positions),
    );
    let mut iter = MarkerWindowIterator::new(source);

    iter.advance_by_size(2, 6);
    let cd0 = CurrentData::new(
        0,
        iter.window(),
        &fixture.ref_samples,
        &fixture.target_samples,
        iter.overlap(),
        2,
        iter.last_window_on_chrom(),
    )
    .unwrap();
    assert_eq!(cd0.prev_splice(), 0);
    assert_eq!(cd0.next_overlap(), 4);
    assert_eq!(cd0.next_splice(), 5);

    iter.advance_by_size(2, 6);
    let cd1 = CurrentData::new(
        1,
        iter.window(),
        &fixture.ref_samples,
        &fixture.target_samples,
        iter.overlap(),
        2,
        iter.last_window_on_chrom(),
    )
    .unwrap();
    assert_eq!(iter.overlap(), 2);
    assert_eq!(cd1.prev_splice(), 1);
    assert_eq!(cd1.next_splice(), cd1.n_markers());

    // the two authoritative regions partition the chromosome
    let emitted0: Vec<u64> = (cd0.prev_splice()..cd0.next_splice())
        .map(|m| cd0.markers().marker(m).pos())
        .collect();
    let emitted1: Vec<u64> = (cd1.prev_splice()..cd1.next_splice())
        .map(|m| cd1.markers().marker(m).pos())
        .collect();
    let mut all = emitted0;
    all.extend(emitted1);
    assert_eq!(all, positions);
}

#[test]
fn test_target_marker_restriction() {
    let fixture = CurrentDataUnitTest::new();
    let emissions = vec![
        fixture.emission(100, vec![0, 1, 0, 1], false),
        fixture.emission(200, vec![0, 0, 1, 1], true),
        fixture.emission(300, vec![1, 1, 0, 0], false),
        fixture.emission(400, vec![0, 1, 1, 0], true),
        fixture.emission(500, vec![0, 0, 0, 1], true),
        fixture.emission(600, vec![1, 0, 1, 0], false),
    ];
    let cd = CurrentData::new(
        0,
        &emissions,
        &fixture.ref_samples,
        &fixture.target_samples,
        0,
        2,
        true,
    )
    .unwrap();

    assert_eq!(cd.n_markers(), 6);
    assert_eq!(cd.n_target_markers(), 3);
    assert_eq!(cd.marker_indices(), &[1, 3, 4]);
    assert_eq!(
        cd.target_markers().marker(1),
        cd.markers().marker(3),
        "Target markers must be the genotyped subsequence"
    );

    let restricted = cd.restricted_ref_sample_hap_pairs();
    assert_eq!(restricted.n_markers(), 3);
    assert_eq!(restricted.n_haps(), 4);
    assert_eq!(restricted.allele(0, 2), 1);
    assert_eq!(restricted.allele(1, 2), 1);
    assert_eq!(restricted.allele(2, 3), 1);

    let targ = cd.target_sample_hap_pairs();
    assert_eq!(targ.n_haps(), 2);
    assert_eq!(targ.allele(0, 0), 0);
    assert_eq!(targ.allele(0, 1), 1);

    // last window on the chromosome: everything from the previous splice
    // onward belongs to this window
    assert_eq!(cd.next_splice(), 6);
    assert_eq!(cd.next_target_splice(), 3);
    assert_eq!(cd.prev_target_splice(), 0);
}

#[test]
fn test_target_splice_indices() {
    let fixture = CurrentDataUnitTest::new();
    let emissions = vec![
        fixture.emission(100, vec![0, 1, 0, 1], true),
        fixture.emission(200, vec![0, 0, 1, 1], true),
        fixture.emission(300, vec![1, 1, 0, 0], false),
        fixture.emission(400, vec![0, 1, 1, 0], true),
        fixture.emission(500, vec![0, 0, 0, 1], true),
        fixture.emission(600, vec![1, 0, 1, 0], true),
    ];
    let cd = CurrentData::new(
        0,
        &emissions,
        &fixture.ref_samples,
        &fixture.target_samples,
        0,
        2,
        false,
    )
    .unwrap();

    // next overlap starts at marker 4, splice at its midpoint
    assert_eq!(cd.next_overlap(), 4);
    assert_eq!(cd.next_splice(), 5);
    assert_eq!(cd.next_target_overlap(), 3);
    assert_eq!(cd.next_target_splice(), 4);
}

#[test]
fn test_mismatched_ref_haplotype_count_is_format_error() {
    let fixture = CurrentDataUnitTest::new();
    let emissions = vec![fixture.emission(100, vec![0, 1], true)];
    let result = CurrentData::new(
        0,
        &emissions,
        &fixture.ref_samples,
        &fixture.target_samples,
        0,
        2,
        true,
    );
    match result {
        Err(ImputationError::FormatError(_)) => {}
        other => panic!("Expected a format error, got {:?}", other),
    }
}
