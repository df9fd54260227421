use std::path::{Path, PathBuf};

use crate::model::marker::Marker;
use crate::model::samples::Samples;

/// Target-side data carried by an emission for a marker genotyped in the
/// target. The three kinds mirror the record types a VCF-backed source can
/// produce; all expose a uniform phased-allele accessor.
#[derive(Debug, Clone)]
pub enum TargetEmission {
    /// One allele index per target haplotype.
    PhasedGenotypes(Vec<u8>),
    /// Per target haplotype, one probability per allele (row-major).
    AlleleProbs(Vec<f64>),
    /// Per target sample, one likelihood per unordered genotype (row-major).
    GenotypeLikelihoods(Vec<f64>),
}

impl TargetEmission {
    /// The modal allele of one target haplotype. Probability and
    /// likelihood records reduce to their most likely configuration.
    pub fn allele(&self, hap: usize, n_alleles: usize) -> u8 {
        match self {
            TargetEmission::PhasedGenotypes(alleles) => alleles[hap],
            TargetEmission::AlleleProbs(probs) => {
                let row = &probs[hap * n_alleles..(hap + 1) * n_alleles];
                argmax(row) as u8
            }
            TargetEmission::GenotypeLikelihoods(likelihoods) => {
                let n_gt = n_alleles * (n_alleles + 1) / 2;
                let sample = hap / 2;
                let row = &likelihoods[sample * n_gt..(sample + 1) * n_gt];
                let (a1, a2) = genotype_alleles(argmax(row));
                if hap % 2 == 0 {
                    a1 as u8
                } else {
                    a2 as u8
                }
            }
        }
    }

    pub fn n_haps(&self, n_alleles: usize, n_samples: usize) -> usize {
        match self {
            TargetEmission::PhasedGenotypes(alleles) => alleles.len(),
            TargetEmission::AlleleProbs(probs) => probs.len() / n_alleles,
            TargetEmission::GenotypeLikelihoods(_) => 2 * n_samples,
        }
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

// inverse of the a2*(a2+1)/2 + a1 genotype index
fn genotype_alleles(gt: usize) -> (usize, usize) {
    let mut a2 = 0usize;
    while (a2 + 1) * (a2 + 2) / 2 <= gt {
        a2 += 1;
    }
    (gt - a2 * (a2 + 1) / 2, a2)
}

/// A per-marker emission: the marker, the phased reference-panel alleles,
/// and the target-side record when the marker is genotyped in the target.
#[derive(Debug, Clone)]
pub struct MarkerEmission {
    marker: Marker,
    ref_alleles: Vec<u8>,
    target: Option<TargetEmission>,
}

impl MarkerEmission {
    pub fn new(
        marker: Marker,
        ref_alleles: Vec<u8>,
        target: Option<TargetEmission>,
    ) -> MarkerEmission {
        MarkerEmission {
            marker,
            ref_alleles,
            target,
        }
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    pub fn chrom_index(&self) -> usize {
        self.marker.chrom_index()
    }

    pub fn pos(&self) -> u64 {
        self.marker.pos()
    }

    pub fn n_ref_haps(&self) -> usize {
        self.ref_alleles.len()
    }

    pub fn ref_allele(&self, hap: usize) -> u8 {
        self.ref_alleles[hap]
    }

    pub fn target(&self) -> Option<&TargetEmission> {
        self.target.as_ref()
    }

    pub fn is_target_marker(&self) -> bool {
        self.target.is_some()
    }
}

/// A lazy, finite, forward-only source of per-marker emissions ordered by
/// (chromosome, position). The source is closed when dropped.
pub trait EmissionSource {
    fn ref_samples(&self) -> &Samples;

    fn target_samples(&self) -> &Samples;

    fn file(&self) -> &Path;

    fn next_emission(&mut self) -> Option<MarkerEmission>;
}

/// Wraps an emission source and drops excluded samples from the reference
/// panel and the target before any window sees them. With empty exclusion
/// sets the wrapper passes records through with their haplotype columns
/// rebuilt unchanged.
pub struct ExcludeSamplesSource<S: EmissionSource> {
    inner: S,
    ref_samples: Samples,
    target_samples: Samples,
    kept_ref_samples: Vec<usize>,
    kept_target_samples: Vec<usize>,
}

impl<S: EmissionSource> ExcludeSamplesSource<S> {
    pub fn new(
        inner: S,
        exclude_from_ref: &std::collections::HashSet<String>,
        exclude_samples: &std::collections::HashSet<String>,
    ) -> ExcludeSamplesSource<S> {
        let (ref_samples, kept_ref_samples) = inner.ref_samples().exclude(exclude_from_ref);
        let (target_samples, kept_target_samples) =
            inner.target_samples().exclude(exclude_samples);
        ExcludeSamplesSource {
            inner,
            ref_samples,
            target_samples,
            kept_ref_samples,
            kept_target_samples,
        }
    }

    fn filter_target(&self, emission: &MarkerEmission, target: &TargetEmission) -> TargetEmission {
        let n_alleles = emission.marker().n_alleles();
        match target {
            TargetEmission::PhasedGenotypes(alleles) => TargetEmission::PhasedGenotypes(
                self.kept_target_samples
                    .iter()
                    .flat_map(|&s| [alleles[2 * s], alleles[2 * s + 1]])
                    .collect(),
            ),
            TargetEmission::AlleleProbs(probs) => TargetEmission::AlleleProbs(
                self.kept_target_samples
                    .iter()
                    .flat_map(|&s| {
                        probs[2 * s * n_alleles..(2 * s + 2) * n_alleles].iter().copied()
                    })
                    .collect(),
            ),
            TargetEmission::GenotypeLikelihoods(likelihoods) => {
                let n_gt = n_alleles * (n_alleles + 1) / 2;
                TargetEmission::GenotypeLikelihoods(
                    self.kept_target_samples
                        .iter()
                        .flat_map(|&s| likelihoods[s * n_gt..(s + 1) * n_gt].iter().copied())
                        .collect(),
                )
            }
        }
    }
}

impl<S: EmissionSource> EmissionSource for ExcludeSamplesSource<S> {
    fn ref_samples(&self) -> &Samples {
        &self.ref_samples
    }

    fn target_samples(&self) -> &Samples {
        &self.target_samples
    }

    fn file(&self) -> &Path {
        self.inner.file()
    }

    fn next_emission(&mut self) -> Option<MarkerEmission> {
        let emission = self.inner.next_emission()?;
        let ref_alleles = self
            .kept_ref_samples
            .iter()
            .flat_map(|&s| [emission.ref_allele(2 * s), emission.ref_allele(2 * s + 1)])
            .collect();
        let target = emission
            .target()
            .map(|t| self.filter_target(&emission, t));
        Some(MarkerEmission::new(
            emission.marker().clone(),
            ref_alleles,
            target,
        ))
    }
}

/// An in-memory emission source. The test entry point, and the seam used
/// when records have already been materialized by an external reader.
#[derive(Debug)]
pub struct VecEmissionSource {
    ref_samples: Samples,
    target_samples: Samples,
    file: PathBuf,
    emissions: std::vec::IntoIter<MarkerEmission>,
}

impl VecEmissionSource {
    pub fn new(
        ref_samples: Samples,
        target_samples: Samples,
        emissions: Vec<MarkerEmission>,
    ) -> VecEmissionSource {
        VecEmissionSource {
            ref_samples,
            target_samples,
            file: PathBuf::from("<memory>"),
            emissions: emissions.into_iter(),
        }
    }
}

impl EmissionSource for VecEmissionSource {
    fn ref_samples(&self) -> &Samples {
        &self.ref_samples
    }

    fn target_samples(&self) -> &Samples {
        &self.target_samples
    }

    fn file(&self) -> &Path {
        &self.file
    }

    fn next_emission(&mut self) -> Option<MarkerEmission> {
        self.emissions.next()
    }
}
