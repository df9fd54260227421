use rayon::prelude::*;

use crate::haplotype::ref_hap_seg::RefHapSegment;
use crate::model::hap_pairs::SampleHapPairs;

/// The nClusters + 1 reference-marker segments bounded by target-cluster
/// boundaries.
///
/// Segment 0 spans [0, clusterEnd(0)); segment j for 0 < j < nClusters
/// spans [clusterStart(j-1), clusterEnd(j)), overlapping each neighbouring
/// cluster's markers; segment nClusters spans
/// [clusterStart(nClusters-1), nRefMarkers). The overlap is what allows
/// allele interpolation to read the same sequence on either side of a
/// cluster boundary.
#[derive(Debug)]
pub struct RefHapSegments {
    segments: Vec<RefHapSegment>,
    cluster_starts: Vec<usize>,
    cluster_ends: Vec<usize>,
    n_ref_markers: usize,
}

impl RefHapSegments {
    /// `cluster_starts` / `cluster_ends` give, per target cluster, its
    /// bounds in reference-marker coordinates. Segment construction is
    /// pure per segment and runs in parallel; each segment lands in its
    /// own slot so the result is deterministic.
    pub fn new(
        ref_haps: &SampleHapPairs,
        cluster_starts: Vec<usize>,
        cluster_ends: Vec<usize>,
    ) -> RefHapSegments {
        let n_clusters = cluster_starts.len();
        assert!(n_clusters > 0, "At least one cluster is required");
        assert_eq!(n_clusters, cluster_ends.len());
        let n_ref_markers = ref_haps.n_markers();

        let bounds: Vec<(usize, usize)> = (0..=n_clusters)
            .map(|j| {
                if j == 0 {
                    (0, cluster_ends[0])
                } else if j < n_clusters {
                    (cluster_starts[j - 1], cluster_ends[j])
                } else {
                    (cluster_starts[n_clusters - 1], n_ref_markers)
                }
            })
            .collect();

        let segments: Vec<RefHapSegment> = bounds
            .into_par_iter()
            .map(|(start, end)| RefHapSegment::new(ref_haps, start, end))
            .collect();

        RefHapSegments {
            segments,
            cluster_starts,
            cluster_ends,
            n_ref_markers,
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.cluster_starts.len()
    }

    pub fn n_ref_markers(&self) -> usize {
        self.n_ref_markers
    }

    /// Reference-marker index of the first marker of cluster `j`.
    pub fn cluster_start(&self, j: usize) -> usize {
        self.cluster_starts[j]
    }

    /// One past the reference-marker index of the last marker of cluster
    /// `j`.
    pub fn cluster_end(&self, j: usize) -> usize {
        self.cluster_ends[j]
    }

    /// Number of distinct sequences of segment `segment`; valid for the
    /// inclusive range 0..=nClusters.
    pub fn n_seq(&self, segment: usize) -> usize {
        self.segment(segment).n_seq()
    }

    /// Sequence index of reference haplotype `hap` in segment `segment`.
    pub fn seq(&self, segment: usize, hap: usize) -> u32 {
        self.segment(segment).seq(hap)
    }

    /// Allele of sequence `seq` at reference marker `marker` (window
    /// coordinates) of segment `segment`.
    pub fn allele(&self, segment: usize, marker: usize, seq: usize) -> u8 {
        let seg = self.segment(segment);
        seg.allele(marker - seg.start(), seq)
    }

    pub fn segment(&self, segment: usize) -> &RefHapSegment {
        assert!(
            segment <= self.n_clusters(),
            "Segment index {} exceeds cluster count {}",
            segment,
            self.n_clusters()
        );
        &self.segments[segment]
    }
}
