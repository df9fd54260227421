use ordered_float::OrderedFloat;

/// VCF annotations emitted by the window writer; each branch knows its
/// field key and its header definition line.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum VcfAnnotations {
    AlleleFrequency,
    AllelicR2,
    DoseR2,
    Genotype,
    Dose,
    GenotypeProbs,
    GenotypeLikelihoods,
}

impl VcfAnnotations {
    pub fn to_key(&self) -> &str {
        match self {
            Self::AlleleFrequency => "AF",
            Self::AllelicR2 => "AR2",
            Self::DoseR2 => "DR2",
            Self::Genotype => "GT",
            Self::Dose => "DS",
            Self::GenotypeProbs => "GP",
            Self::GenotypeLikelihoods => "GL",
        }
    }

    pub fn header_line(&self) -> &str {
        match self {
            Self::AlleleFrequency => {
                "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Estimated ALT Allele Frequencies\">"
            }
            Self::AllelicR2 => {
                "##INFO=<ID=AR2,Number=1,Type=Float,Description=\"Allelic R-Squared: estimated squared correlation between most probable ALT dose and true ALT dose\">"
            }
            Self::DoseR2 => {
                "##INFO=<ID=DR2,Number=1,Type=Float,Description=\"Dosage R-Squared: estimated squared correlation between estimated ALT dose and true ALT dose\">"
            }
            Self::Genotype => "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
            Self::Dose => {
                "##FORMAT=<ID=DS,Number=A,Type=Float,Description=\"estimated ALT dose [P(RA) + 2*P(AA)]\">"
            }
            Self::GenotypeProbs => {
                "##FORMAT=<ID=GP,Number=G,Type=Float,Description=\"Estimated Genotype Probability\">"
            }
            Self::GenotypeLikelihoods => {
                "##FORMAT=<ID=GL,Number=G,Type=Float,Description=\"Log10-scaled Genotype Likelihood\">"
            }
        }
    }
}

/// Accumulates per-sample genotype or allele probabilities at one marker
/// and derives allele frequencies and the imputation-quality R-squared
/// statistics.
///
/// Multi-allelic genotype probabilities are reduced to hom-ref / het / alt
/// buckets before the dose sums are updated, so the dose is the expected
/// count of non-reference alleles.
#[derive(Debug, Clone)]
pub struct GenotypeStats {
    n_alleles: usize,
    allele_freq_sums: Vec<f64>,
    sum_call: f64,
    sum_square_call: f64,
    sum_expected: f64,
    sum_expected_square: f64,
    sum_square_expected: f64,
    sum_call_expected: f64,
    n_samples: usize,
}

impl GenotypeStats {
    pub fn new(n_alleles: usize) -> GenotypeStats {
        GenotypeStats {
            n_alleles,
            allele_freq_sums: vec![0f64; n_alleles],
            sum_call: 0.0,
            sum_square_call: 0.0,
            sum_expected: 0.0,
            sum_expected_square: 0.0,
            sum_square_expected: 0.0,
            sum_call_expected: 0.0,
            n_samples: 0,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Add one sample's unordered genotype probabilities, indexed by
    /// a2*(a2+1)/2 + a1 with a2 >= a1. The probabilities may be
    /// unnormalized.
    pub fn add_sample_gt_probs(&mut self, gt_probs: &[f64]) {
        let mut buckets = [0f64; 3];
        let mut marginals = vec![0f64; self.n_alleles];
        let mut gt = 0usize;
        for a2 in 0..self.n_alleles {
            for a1 in 0..=a2 {
                let p = gt_probs[gt];
                let bucket = if a2 == 0 {
                    0
                } else if a1 == 0 {
                    1
                } else {
                    2
                };
                buckets[bucket] += p;
                marginals[a1] += p;
                marginals[a2] += p;
                gt += 1;
            }
        }
        let sum: f64 = buckets.iter().sum();
        if sum > 0.0 {
            for b in buckets.iter_mut() {
                *b /= sum;
            }
            for (freq, m) in self.allele_freq_sums.iter_mut().zip(marginals.iter()) {
                *freq += m / sum;
            }
        }
        self.add_buckets(buckets);
    }

    /// Add one sample from the allele probabilities of its two phased
    /// haplotypes (one probability per allele each).
    pub fn add_sample_allele_probs(&mut self, hap1: &[f64], hap2: &[f64]) {
        let sum1: f64 = hap1.iter().sum();
        let sum2: f64 = hap2.iter().sum();
        let (p1_ref, p2_ref) = if sum1 > 0.0 && sum2 > 0.0 {
            (hap1[0] / sum1, hap2[0] / sum2)
        } else {
            // all-zero rows can occur at chromosome ends
            (0.0, 0.0)
        };
        let buckets = [
            p1_ref * p2_ref,
            p1_ref * (1.0 - p2_ref) + (1.0 - p1_ref) * p2_ref,
            (1.0 - p1_ref) * (1.0 - p2_ref),
        ];
        if sum1 > 0.0 && sum2 > 0.0 {
            for (a, freq) in self.allele_freq_sums.iter_mut().enumerate() {
                *freq += hap1[a] / sum1 + hap2[a] / sum2;
            }
        }
        self.add_buckets(buckets);
    }

    fn add_buckets(&mut self, buckets: [f64; 3]) {
        let call = (0..3)
            .max_by_key(|&i| OrderedFloat(buckets[i]))
            .unwrap() as f64;
        let expected = buckets[1] + 2.0 * buckets[2];
        let expected_square = buckets[1] + 4.0 * buckets[2];
        self.sum_call += call;
        self.sum_square_call += call * call;
        self.sum_expected += expected;
        self.sum_expected_square += expected_square;
        self.sum_square_expected += expected * expected;
        self.sum_call_expected += call * expected;
        self.n_samples += 1;
    }

    /// Estimated frequency of `allele`, averaged over 2N haplotypes.
    pub fn allele_freq(&self, allele: usize) -> f64 {
        if self.n_samples == 0 {
            return 0.0;
        }
        self.allele_freq_sums[allele] / (2.0 * self.n_samples as f64)
    }

    /// Squared correlation between the most probable ALT dose and the
    /// estimated ALT dose.
    pub fn allelic_r2(&self) -> f64 {
        let n = self.n_samples as f64;
        if self.n_samples == 0 {
            return 0.0;
        }
        let cov = self.sum_call_expected - self.sum_call * self.sum_expected / n;
        let var_best = self.sum_square_call - self.sum_call * self.sum_call / n;
        let var_exp = self.sum_expected_square - self.sum_expected * self.sum_expected / n;
        let den = var_best * var_exp;
        if den <= 0.0 {
            return 0.0;
        }
        (cov * cov / den).max(0.0)
    }

    /// Estimated squared correlation between the estimated ALT dose and
    /// the true ALT dose.
    pub fn dose_r2(&self) -> f64 {
        let n = self.n_samples as f64;
        if self.n_samples == 0 {
            return 0.0;
        }
        let num = self.sum_square_expected - self.sum_expected * self.sum_expected / n;
        let den = self.sum_expected_square - self.sum_expected * self.sum_expected / n;
        if den == 0.0 {
            return 0.0;
        }
        (num / den).abs()
    }

    /// Dose R-squared against the Hardy-Weinberg dose variance 2p(1-p).
    pub fn hwe_dose_r2(&self) -> f64 {
        let n = self.n_samples as f64;
        if self.n_samples == 0 {
            return 0.0;
        }
        let p = self.sum_expected / (2.0 * n);
        if p <= 0.0 || p >= 1.0 {
            return 0.0;
        }
        let num = self.sum_square_expected - self.sum_expected * self.sum_expected / n;
        (num / n) / (2.0 * p * (1.0 - p))
    }
}
