use std::sync::Arc;

use crate::model::marker::Marker;

/// An ordered, immutable sequence of markers on a single chromosome.
///
/// Carries the allele-prefix table `sum_alleles(m)` = sum of `n_alleles(k)`
/// for k < m, which is the base offset of marker m in any allele-indexed
/// flat array.
#[derive(Debug, Clone, PartialEq)]
pub struct Markers {
    markers: Arc<Vec<Marker>>,
    sum_alleles: Arc<Vec<usize>>,
}

impl Markers {
    pub fn new(markers: Vec<Marker>) -> Markers {
        for pair in markers.windows(2) {
            if pair[0].chrom_index() != pair[1].chrom_index() {
                panic!(
                    "Markers {} and {} are on different chromosomes",
                    pair[0], pair[1]
                );
            }
            if pair[0].pos() > pair[1].pos() {
                panic!("Markers out of order: {} before {}", pair[0], pair[1]);
            }
        }
        let mut sum_alleles = Vec::with_capacity(markers.len() + 1);
        let mut sum = 0usize;
        sum_alleles.push(0);
        for m in markers.iter() {
            sum += m.n_alleles();
            sum_alleles.push(sum);
        }
        Markers {
            markers: Arc::new(markers),
            sum_alleles: Arc::new(sum_alleles),
        }
    }

    pub fn n_markers(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, index: usize) -> &Marker {
        &self.markers[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    /// Base offset of marker `m` in a flat allele-indexed array; `m` may be
    /// `n_markers()`, in which case the total allele count is returned.
    pub fn sum_alleles(&self, m: usize) -> usize {
        self.sum_alleles[m]
    }

    pub fn total_alleles(&self) -> usize {
        self.sum_alleles[self.markers.len()]
    }

    /// A new Markers containing the markers at the given strictly
    /// increasing indices.
    pub fn restrict_to_indices(&self, indices: &[usize]) -> Markers {
        Markers::new(indices.iter().map(|&i| self.markers[i].clone()).collect())
    }

    /// Indices into `self` of each marker of `subset`, or None if `subset`
    /// is not an ordered subsequence of `self`.
    pub fn indices_of(&self, subset: &Markers) -> Option<Vec<usize>> {
        let mut indices = Vec::with_capacity(subset.n_markers());
        let mut j = 0usize;
        for target in subset.iter() {
            while j < self.markers.len() && &self.markers[j] != target {
                j += 1;
            }
            if j == self.markers.len() {
                return None;
            }
            indices.push(j);
            j += 1;
        }
        Some(indices)
    }
}
