use ndarray::Array2;

use crate::model::markers::Markers;
use crate::model::samples::Samples;

/// Phased haplotype pairs for a set of samples over a set of markers.
///
/// Alleles are stored in a dense (nHaps x nMarkers) matrix of allele
/// indices. Haplotypes 2*s and 2*s + 1 belong to sample s.
#[derive(Debug, Clone)]
pub struct SampleHapPairs {
    samples: Samples,
    markers: Markers,
    // row = haplotype, column = marker
    alleles: Array2<u8>,
}

impl SampleHapPairs {
    pub fn new(samples: Samples, markers: Markers, alleles: Array2<u8>) -> SampleHapPairs {
        if alleles.nrows() != 2 * samples.n_samples() {
            panic!(
                "Allele matrix has {} rows for {} samples",
                alleles.nrows(),
                samples.n_samples()
            );
        }
        if alleles.ncols() != markers.n_markers() {
            panic!(
                "Allele matrix has {} columns for {} markers",
                alleles.ncols(),
                markers.n_markers()
            );
        }
        for m in 0..markers.n_markers() {
            let n_alleles = markers.marker(m).n_alleles() as u8;
            for h in 0..alleles.nrows() {
                if alleles[[h, m]] >= n_alleles {
                    panic!(
                        "Allele {} out of range at marker {} haplotype {}",
                        alleles[[h, m]],
                        markers.marker(m),
                        h
                    );
                }
            }
        }
        SampleHapPairs {
            samples,
            markers,
            alleles,
        }
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn n_samples(&self) -> usize {
        self.samples.n_samples()
    }

    pub fn n_haps(&self) -> usize {
        2 * self.samples.n_samples()
    }

    pub fn n_markers(&self) -> usize {
        self.markers.n_markers()
    }

    pub fn allele(&self, marker: usize, hap: usize) -> u8 {
        self.alleles[[hap, marker]]
    }

    pub fn allele1(&self, marker: usize, sample: usize) -> u8 {
        self.alleles[[2 * sample, marker]]
    }

    pub fn allele2(&self, marker: usize, sample: usize) -> u8 {
        self.alleles[[2 * sample + 1, marker]]
    }

    /// A new SampleHapPairs restricted to the markers at the given strictly
    /// increasing marker indices.
    pub fn restrict_to_indices(&self, indices: &[usize]) -> SampleHapPairs {
        let markers = self.markers.restrict_to_indices(indices);
        let mut alleles = Array2::zeros((self.n_haps(), indices.len()));
        for (col, &m) in indices.iter().enumerate() {
            for h in 0..self.n_haps() {
                alleles[[h, col]] = self.alleles[[h, m]];
            }
        }
        SampleHapPairs::new(self.samples.clone(), markers, alleles)
    }
}
