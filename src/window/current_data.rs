use std::cmp::min;

use ndarray::Array2;

use crate::model::hap_pairs::SampleHapPairs;
use crate::model::markers::Markers;
use crate::model::samples::Samples;
use crate::utils::errors::ImputationError;
use crate::window::emission::MarkerEmission;

/// The per-window bundle handed to the imputation engines.
///
/// Partitions the window into a previous-splice region (markers the
/// previous window already produced final output for), an own region, and
/// a next-splice overlap whose output belongs to the next window. The
/// splice point inside an overlap is its midpoint, moved left past any run
/// of markers at one base-pair position so both windows pick the same
/// marker.
#[derive(Debug)]
pub struct CurrentData {
    window_index: usize,
    markers: Markers,
    target_markers: Markers,
    marker_indices: Vec<usize>,
    ref_hap_pairs: SampleHapPairs,
    restricted_ref_hap_pairs: SampleHapPairs,
    target_hap_pairs: SampleHapPairs,
    prev_splice: usize,
    next_overlap: usize,
    next_splice: usize,
    prev_target_splice: usize,
    next_target_overlap: usize,
    next_target_splice: usize,
}

impl CurrentData {
    /// Build the view for the window just produced by the iterator.
    /// `overlap` is the actual overlap recorded at the advance;
    /// `requested_overlap` is the configured overlap the next advance will
    /// request.
    pub fn new(
        window_index: usize,
        emissions: &[MarkerEmission],
        ref_samples: &Samples,
        target_samples: &Samples,
        overlap: usize,
        requested_overlap: usize,
        last_window_on_chrom: bool,
    ) -> Result<CurrentData, ImputationError> {
        if emissions.is_empty() {
            return Err(ImputationError::ConsistencyError(String::from(
                "Empty marker window",
            )));
        }
        let n_ref_haps = 2 * ref_samples.n_samples();
        let n_target_haps = 2 * target_samples.n_samples();
        for e in emissions.iter() {
            if e.n_ref_haps() != n_ref_haps {
                return Err(ImputationError::FormatError(format!(
                    "Marker {} carries {} reference haplotypes, expected {}",
                    e.marker(),
                    e.n_ref_haps(),
                    n_ref_haps
                )));
            }
        }

        let markers = Markers::new(emissions.iter().map(|e| e.marker().clone()).collect());
        let marker_indices: Vec<usize> = emissions
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_target_marker())
            .map(|(i, _)| i)
            .collect();
        let target_markers = markers.restrict_to_indices(&marker_indices);

        let mut ref_alleles = Array2::zeros((n_ref_haps, emissions.len()));
        for (m, e) in emissions.iter().enumerate() {
            for h in 0..n_ref_haps {
                ref_alleles[[h, m]] = e.ref_allele(h);
            }
        }
        let ref_hap_pairs =
            SampleHapPairs::new(ref_samples.clone(), markers.clone(), ref_alleles);
        let restricted_ref_hap_pairs = ref_hap_pairs.restrict_to_indices(&marker_indices);

        let mut target_alleles = Array2::zeros((n_target_haps, marker_indices.len()));
        for (col, &m) in marker_indices.iter().enumerate() {
            let e = &emissions[m];
            let n_alleles = e.marker().n_alleles();
            let target = e.target().unwrap();
            for h in 0..n_target_haps {
                target_alleles[[h, col]] = target.allele(h, n_alleles);
            }
        }
        let target_hap_pairs = SampleHapPairs::new(
            target_samples.clone(),
            target_markers.clone(),
            target_alleles,
        );

        let n = markers.n_markers();
        let prev_splice = if overlap == 0 {
            0
        } else {
            splice_point(&markers, 0, overlap)
        };
        let next_overlap = if last_window_on_chrom {
            n
        } else {
            let mut boundary = n - min(requested_overlap, n);
            while boundary > 0
                && boundary < n
                && markers.marker(boundary).pos() == markers.marker(boundary - 1).pos()
            {
                boundary -= 1;
            }
            boundary
        };
        let next_splice = if last_window_on_chrom {
            n
        } else {
            splice_point(&markers, next_overlap, n)
        };

        let prev_target_splice = target_index_at(&marker_indices, prev_splice);
        let next_target_overlap = target_index_at(&marker_indices, next_overlap);
        let next_target_splice = target_index_at(&marker_indices, next_splice);

        Ok(CurrentData {
            window_index,
            markers,
            target_markers,
            marker_indices,
            ref_hap_pairs,
            restricted_ref_hap_pairs,
            target_hap_pairs,
            prev_splice,
            next_overlap,
            next_splice,
            prev_target_splice,
            next_target_overlap,
            next_target_splice,
        })
    }

    pub fn window_index(&self) -> usize {
        self.window_index
    }

    /// All reference markers in the window.
    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn n_markers(&self) -> usize {
        self.markers.n_markers()
    }

    /// The target-genotyped subsequence of `markers()`.
    pub fn target_markers(&self) -> &Markers {
        &self.target_markers
    }

    pub fn n_target_markers(&self) -> usize {
        self.target_markers.n_markers()
    }

    /// Reference-marker index of each target marker; strictly increasing.
    pub fn marker_indices(&self) -> &[usize] {
        &self.marker_indices
    }

    pub fn ref_sample_hap_pairs(&self) -> &SampleHapPairs {
        &self.ref_hap_pairs
    }

    /// Reference haplotypes restricted to the target markers.
    pub fn restricted_ref_sample_hap_pairs(&self) -> &SampleHapPairs {
        &self.restricted_ref_hap_pairs
    }

    pub fn target_sample_hap_pairs(&self) -> &SampleHapPairs {
        &self.target_hap_pairs
    }

    pub fn target_samples(&self) -> &Samples {
        self.target_hap_pairs.samples()
    }

    /// First reference-marker index this window is authoritative for.
    pub fn prev_splice(&self) -> usize {
        self.prev_splice
    }

    /// First reference-marker index of the overlap handed to the next
    /// window.
    pub fn next_overlap(&self) -> usize {
        self.next_overlap
    }

    /// Reference-marker index at which the next window becomes
    /// authoritative.
    pub fn next_splice(&self) -> usize {
        self.next_splice
    }

    pub fn prev_target_splice(&self) -> usize {
        self.prev_target_splice
    }

    pub fn next_target_overlap(&self) -> usize {
        self.next_target_overlap
    }

    pub fn next_target_splice(&self) -> usize {
        self.next_target_splice
    }
}

// Midpoint of [lo, hi), moved left while it would split markers at one
// base-pair position.
fn splice_point(markers: &Markers, lo: usize, hi: usize) -> usize {
    let mut mid = lo + (hi - lo) / 2;
    while mid > lo && markers.marker(mid).pos() == markers.marker(mid - 1).pos() {
        mid -= 1;
    }
    mid
}

// Number of target markers with reference index < ref_index.
fn target_index_at(marker_indices: &[usize], ref_index: usize) -> usize {
    marker_indices.partition_point(|&m| m < ref_index)
}
