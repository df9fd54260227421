use crate::model::marker::genotype_index;
use crate::model::markers::Markers;
use crate::model::samples::Samples;

/// Per-marker, per-sample unordered genotype probabilities. Genotype
/// (a1, a2) with a2 >= a1 is stored at index a2*(a2+1)/2 + a1 within each
/// sample's block.
#[derive(Debug, Clone)]
pub struct GenotypeValues {
    markers: Markers,
    samples: Samples,
    // one block of n_genotypes values per (marker, sample)
    values: Vec<Vec<f64>>,
}

impl GenotypeValues {
    pub fn new(markers: Markers, samples: Samples) -> GenotypeValues {
        let n_samples = samples.n_samples();
        let values = (0..markers.n_markers())
            .map(|m| vec![0f64; markers.marker(m).n_genotypes() * n_samples])
            .collect();
        GenotypeValues {
            markers,
            samples,
            values,
        }
    }

    /// Point-mass genotype probabilities from observed phased allele pairs.
    pub fn from_phased_alleles(
        markers: Markers,
        samples: Samples,
        allele_pairs: &dyn Fn(usize, usize) -> (u8, u8),
    ) -> GenotypeValues {
        let mut gv = GenotypeValues::new(markers, samples);
        for m in 0..gv.markers.n_markers() {
            for s in 0..gv.samples.n_samples() {
                let (a1, a2) = allele_pairs(m, s);
                gv.add(m, s, genotype_index(a1 as usize, a2 as usize), 1.0);
            }
        }
        gv
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn add(&mut self, marker: usize, sample: usize, gt: usize, value: f64) {
        let n_gt = self.markers.marker(marker).n_genotypes();
        self.values[marker][sample * n_gt + gt] += value;
    }

    pub fn value(&self, marker: usize, sample: usize, gt: usize) -> f64 {
        let n_gt = self.markers.marker(marker).n_genotypes();
        self.values[marker][sample * n_gt + gt]
    }

    /// The genotype probabilities of one sample at one marker.
    pub fn sample_values(&self, marker: usize, sample: usize) -> &[f64] {
        let n_gt = self.markers.marker(marker).n_genotypes();
        &self.values[marker][sample * n_gt..(sample + 1) * n_gt]
    }
}
