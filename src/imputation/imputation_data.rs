use crate::haplotype::hap_coder::HaplotypeCoder;
use crate::haplotype::ref_hap_segs::RefHapSegments;
use crate::model::genetic_map::GeneticMap;
use crate::model::markers::Markers;
use crate::window::current_data::CurrentData;

/// Minimum genetic distance between cluster midpoints when computing
/// recombination probabilities.
const MIN_CM_DIST: f64 = 1e-7;

/// Groups consecutive target markers into clusters whose genetic span does
/// not exceed `cluster_cm`, except where a single inter-marker gap already
/// does. Returns the cluster start indices in target-marker coordinates.
pub fn cluster_starts(gen_pos: &[f64], cluster_cm: f64) -> Vec<usize> {
    assert!(cluster_cm > 0.0, "Cluster cM distance must be positive");
    let mut starts = vec![0usize];
    for m in 1..gen_pos.len() {
        if gen_pos[m] - gen_pos[starts[starts.len() - 1]] > cluster_cm {
            starts.push(m);
        }
    }
    starts
}

/// The immutable per-window bundle consumed by the HMM: coded cluster
/// alleles for reference and target haplotypes, per-cluster error and
/// recombination probabilities, and per-marker interpolation weights.
#[derive(Debug)]
pub struct ImputationData {
    markers: Markers,
    ref_segments: RefHapSegments,
    // per cluster, one sequence code per haplotype
    ref_alleles: Vec<Vec<u32>>,
    targ_alleles: Vec<Vec<u32>>,
    err_prob: Vec<f64>,
    no_err_prob: Vec<f64>,
    p_recomb: Vec<f64>,
    weight: Vec<f64>,
    n_ref_haps: usize,
    n_target_haps: usize,
}

impl ImputationData {
    pub fn new(
        cd: &CurrentData,
        map: &dyn GeneticMap,
        cluster_cm: f64,
        err_rate: f64,
        ne: f64,
    ) -> ImputationData {
        assert!(
            cd.n_target_markers() > 0,
            "Window {} has no target markers",
            cd.window_index()
        );
        let targ_gen_pos: Vec<f64> = cd
            .target_markers()
            .iter()
            .map(|m| map.gen_pos_marker(m))
            .collect();
        let starts = cluster_starts(&targ_gen_pos, cluster_cm);
        let n_clusters = starts.len();
        let ends: Vec<usize> = (1..n_clusters)
            .map(|j| starts[j])
            .chain(std::iter::once(cd.n_target_markers()))
            .collect();

        // cluster bounds in reference-marker coordinates
        let indices = cd.marker_indices();
        let ref_starts: Vec<usize> = starts.iter().map(|&s| indices[s]).collect();
        let ref_ends: Vec<usize> = ends.iter().map(|&e| indices[e - 1] + 1).collect();

        let ref_segments = RefHapSegments::new(
            cd.ref_sample_hap_pairs(),
            ref_starts.clone(),
            ref_ends.clone(),
        );

        let coder = HaplotypeCoder::new(
            cd.restricted_ref_sample_hap_pairs(),
            cd.target_sample_hap_pairs(),
        );
        let mut ref_alleles = Vec::with_capacity(n_clusters);
        let mut targ_alleles = Vec::with_capacity(n_clusters);
        for c in 0..n_clusters {
            let (ref_codes, targ_codes) = coder.code_range(starts[c], ends[c]);
            ref_alleles.push(ref_codes);
            targ_alleles.push(targ_codes);
        }

        let err_prob: Vec<f64> = (0..n_clusters)
            .map(|c| (err_rate * (ends[c] - starts[c]) as f64).min(0.5))
            .collect();
        let no_err_prob: Vec<f64> = err_prob.iter().map(|e| 1.0 - e).collect();

        let n_ref_haps = cd.ref_sample_hap_pairs().n_haps();
        let ref_gen_pos: Vec<f64> = cd.markers().iter().map(|m| map.gen_pos_marker(m)).collect();
        let p_recomb = p_recomb(&ref_starts, &ref_ends, &ref_gen_pos, ne, n_ref_haps);
        let weight = interpolation_weights(&ref_starts, &ref_ends, &ref_gen_pos);

        ImputationData {
            markers: cd.markers().clone(),
            ref_segments,
            ref_alleles,
            targ_alleles,
            err_prob,
            no_err_prob,
            p_recomb,
            weight,
            n_ref_haps,
            n_target_haps: cd.target_sample_hap_pairs().n_haps(),
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn ref_segments(&self) -> &RefHapSegments {
        &self.ref_segments
    }

    pub fn n_clusters(&self) -> usize {
        self.ref_alleles.len()
    }

    pub fn n_ref_haps(&self) -> usize {
        self.n_ref_haps
    }

    pub fn n_target_haps(&self) -> usize {
        self.n_target_haps
    }

    /// Sequence code of reference haplotype `hap` over cluster `c`.
    pub fn ref_allele(&self, c: usize, hap: usize) -> u32 {
        self.ref_alleles[c][hap]
    }

    /// Sequence code of target haplotype `hap` over cluster `c`.
    pub fn targ_allele(&self, c: usize, hap: usize) -> u32 {
        self.targ_alleles[c][hap]
    }

    /// Allele-mismatch probability of cluster `c`.
    pub fn err_prob(&self, c: usize) -> f64 {
        self.err_prob[c]
    }

    pub fn no_err_prob(&self, c: usize) -> f64 {
        self.no_err_prob[c]
    }

    /// Probability of recombination on the transition into cluster `c`;
    /// zero for the first cluster.
    pub fn p_recomb(&self, c: usize) -> f64 {
        self.p_recomb[c]
    }

    /// Interpolation weight of reference marker `m`: NaN outside the
    /// cluster grid, 1.0 inside a cluster's marker range, and the linear
    /// genetic-distance weight of the preceding cluster in a gap.
    pub fn weight(&self, m: usize) -> f64 {
        self.weight[m]
    }
}

// 1 - exp(-0.04 * ne * d / H) with d the genetic distance between the
// reference-coordinate midpoints of consecutive clusters.
fn p_recomb(
    ref_starts: &[usize],
    ref_ends: &[usize],
    ref_gen_pos: &[f64],
    ne: f64,
    n_ref_haps: usize,
) -> Vec<f64> {
    let n_clusters = ref_starts.len();
    let coeff = -0.04 * ne / n_ref_haps as f64;
    let mid = |j: usize| (ref_starts[j] + ref_ends[j]) / 2;
    let mut p = Vec::with_capacity(n_clusters);
    p.push(0.0);
    for c in 1..n_clusters {
        let gen_dist = (ref_gen_pos[mid(c)] - ref_gen_pos[mid(c - 1)])
            .abs()
            .max(MIN_CM_DIST);
        p.push(-f64::exp_m1(coeff * gen_dist));
    }
    p
}

fn interpolation_weights(
    ref_starts: &[usize],
    ref_ends: &[usize],
    ref_gen_pos: &[f64],
) -> Vec<f64> {
    let n_clusters = ref_starts.len();
    let n_markers = ref_gen_pos.len();
    let mut weight = vec![f64::NAN; n_markers];
    // markers before the first cluster start and from the last cluster
    // start onward keep NaN
    for c in 0..n_clusters.saturating_sub(1) {
        let cluster_end = ref_ends[c];
        for w in weight[ref_starts[c]..cluster_end].iter_mut() {
            *w = 1.0;
        }
        let next_start = ref_starts[c + 1];
        let den = ref_gen_pos[next_start] - ref_gen_pos[cluster_end - 1];
        for m in cluster_end..next_start {
            weight[m] = if den > 0.0 {
                (ref_gen_pos[next_start] - ref_gen_pos[m]) / den
            } else {
                1.0
            };
        }
    }
    weight
}
