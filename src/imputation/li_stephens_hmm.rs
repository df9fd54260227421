use crate::imputation::imputation_data::ImputationData;

/// Li-Stephens hidden Markov model for a single target haplotype.
///
/// States are reference haplotypes, transitions are recombinations between
/// consecutive target-marker clusters, and emissions compare the coded
/// cluster allele of the target with that of each reference haplotype.
/// The engine runs a normalized forward pass, a backward pass that
/// re-materializes forward columns on demand from a bounded checkpoint
/// buffer, projects per-cluster state probabilities onto the distinct
/// sequences of the bracketing reference segments, and interpolates those
/// onto reference alleles at every marker of the window.
///
/// Scratch buffers are allocated once at construction; the per-cluster
/// recurrences allocate nothing.
pub struct LiStephensHmm<'a> {
    data: &'a ImputationData,
    n_ref_haps: usize,
    n_clusters: usize,
    // forward columns; length n_clusters, or the checkpoint count in
    // low-mem mode
    fwd: Vec<Vec<f64>>,
    // cluster whose forward values each column currently holds
    fwd_cluster: Vec<i32>,
    window_index: i32,
    array_index: i32,
    scratch: Vec<f64>,
    bwd: Vec<f64>,
    em_bwd: Vec<f64>,
    sum_em_bwd: f64,
    // per cluster c: state probability mass per sequence of segment c+1
    // (forward side) and segment c (backward side)
    fwd_hap_probs: Vec<Vec<f64>>,
    bwd_hap_probs: Vec<Vec<f64>>,
    hap: usize,
}

impl<'a> LiStephensHmm<'a> {
    /// Sequences below 0.5/nSeq of per-cluster mass are pruned during
    /// allele projection.
    const SEQ_PROB_THRESHOLD_FACTOR: f64 = 0.5;

    pub fn new(data: &'a ImputationData, low_mem: bool) -> LiStephensHmm<'a> {
        let n_ref_haps = data.n_ref_haps();
        let n_clusters = data.n_clusters();
        let n_stored = if low_mem {
            let k = ((1.0 + 8.0 * n_clusters as f64).sqrt() / 2.0).ceil() as usize + 1;
            k.min(n_clusters)
        } else {
            n_clusters
        };
        let segs = data.ref_segments();
        let fwd_hap_probs = (0..n_clusters).map(|c| vec![0f64; segs.n_seq(c + 1)]).collect();
        let bwd_hap_probs = (0..n_clusters).map(|c| vec![0f64; segs.n_seq(c)]).collect();
        LiStephensHmm {
            data,
            n_ref_haps,
            n_clusters,
            fwd: vec![vec![0f64; n_ref_haps]; n_stored],
            fwd_cluster: vec![-1; n_stored],
            window_index: -1,
            array_index: -1,
            scratch: vec![0f64; n_ref_haps],
            bwd: vec![0f64; n_ref_haps],
            em_bwd: vec![0f64; n_ref_haps],
            sum_em_bwd: 0.0,
            fwd_hap_probs,
            bwd_hap_probs,
            hap: 0,
        }
    }

    /// Posterior allele probabilities for one target haplotype over every
    /// reference marker of the window, as a flat array indexed by
    /// `markers.sum_alleles(m) + allele`.
    pub fn impute(&mut self, target_hap: usize) -> Vec<f32> {
        assert!(
            target_hap < self.data.n_target_haps(),
            "Target haplotype {} out of range ({} haplotypes)",
            target_hap,
            self.data.n_target_haps()
        );
        self.hap = target_hap;
        self.window_index = -1;
        self.array_index = -1;

        for c in 0..self.n_clusters {
            self.set_fwd_values(c);
        }
        self.set_initial_bwd_values();
        self.set_state_probs(self.n_clusters - 1, self.current_index());
        for c in (0..self.n_clusters - 1).rev() {
            self.set_bwd_values(c);
            let fwd_index = self.previous_index();
            self.set_state_probs(c, fwd_index);
        }

        let mut allele_probs = vec![0f32; self.data.markers().total_alleles()];
        self.set_allele_probs(&mut allele_probs);
        allele_probs
    }

    fn emission(&self, cluster: usize, ref_hap: usize) -> f64 {
        if self.data.targ_allele(cluster, self.hap) == self.data.ref_allele(cluster, ref_hap) {
            self.data.no_err_prob(cluster)
        } else {
            self.data.err_prob(cluster)
        }
    }

    // ------------------------------------------------------------------
    // checkpointed forward buffer
    //
    // Slot addressing follows a triangular wave: next_index() advances the
    // array index, and on overflow restarts it from an advancing window
    // index, so later waves overwrite all but a thinning set of
    // checkpoints. previous_index() walks back through retained columns
    // and, on hitting the window index, drops to the previous checkpoint
    // and re-materializes every column above it. Forward storage is
    // O(sqrt(nClusters) * nRefHaps).
    // ------------------------------------------------------------------

    fn current_index(&self) -> usize {
        self.array_index as usize
    }

    fn next_index(&mut self) -> usize {
        self.array_index += 1;
        if self.array_index as usize == self.fwd.len() {
            self.window_index += 1;
            self.array_index = self.window_index;
        }
        self.array_index as usize
    }

    fn previous_index(&mut self) -> usize {
        if self.array_index > self.window_index {
            self.array_index -= 1;
            self.array_index as usize
        } else {
            self.window_index -= 1;
            self.array_index = self.window_index;
            let start = if self.window_index < 0 {
                0
            } else {
                self.fwd_cluster[self.array_index as usize] as usize + 1
            };
            let n_rebuilt = (self.fwd.len() as i32 - 1 - self.array_index) as usize;
            for c in start..start + n_rebuilt {
                self.set_fwd_values(c);
            }
            self.current_index()
        }
    }

    fn set_fwd_values(&mut self, cluster: usize) {
        let n = self.n_ref_haps;
        if cluster == 0 {
            let mut sum = 0f64;
            for h in 0..n {
                self.scratch[h] = self.emission(0, h);
                sum += self.scratch[h];
            }
            for v in self.scratch.iter_mut() {
                *v /= sum;
            }
        } else {
            let prev = self.current_index();
            let r = self.data.p_recomb(cluster);
            let shift = r / n as f64;
            let scale = 1.0 - r;
            let mut sum = 0f64;
            for h in 0..n {
                let v = self.emission(cluster, h) * (shift + scale * self.fwd[prev][h]);
                self.scratch[h] = v;
                sum += v;
            }
            for v in self.scratch.iter_mut() {
                *v /= sum;
            }
        }
        let index = self.next_index();
        std::mem::swap(&mut self.fwd[index], &mut self.scratch);
        self.fwd_cluster[index] = cluster as i32;
    }

    // ------------------------------------------------------------------
    // backward recurrence
    // ------------------------------------------------------------------

    fn set_initial_bwd_values(&mut self) {
        let n = self.n_ref_haps;
        let last = self.n_clusters - 1;
        let uniform = 1.0 / n as f64;
        self.sum_em_bwd = 0.0;
        for h in 0..n {
            self.bwd[h] = uniform;
            self.em_bwd[h] = uniform * self.emission(last, h);
            self.sum_em_bwd += self.em_bwd[h];
        }
    }

    fn set_bwd_values(&mut self, cluster: usize) {
        let n = self.n_ref_haps;
        let r = self.data.p_recomb(cluster + 1);
        let shift = self.sum_em_bwd * r / n as f64;
        let scale = 1.0 - r;
        let mut sum = 0f64;
        for h in 0..n {
            self.bwd[h] = shift + scale * self.em_bwd[h];
            sum += self.bwd[h];
        }
        self.sum_em_bwd = 0.0;
        for h in 0..n {
            self.bwd[h] /= sum;
            self.em_bwd[h] = self.bwd[h] * self.emission(cluster, h);
            self.sum_em_bwd += self.em_bwd[h];
        }
    }

    // ------------------------------------------------------------------
    // projection onto segment sequences and reference alleles
    // ------------------------------------------------------------------

    fn set_state_probs(&mut self, cluster: usize, fwd_index: usize) {
        let segs = self.data.ref_segments();
        let fwd_probs = &mut self.fwd_hap_probs[cluster];
        let bwd_probs = &mut self.bwd_hap_probs[cluster];
        fwd_probs.iter_mut().for_each(|v| *v = 0.0);
        bwd_probs.iter_mut().for_each(|v| *v = 0.0);
        let fwd_col = &self.fwd[fwd_index];
        for h in 0..self.n_ref_haps {
            let state_prob = fwd_col[h] * self.bwd[h];
            fwd_probs[segs.seq(cluster + 1, h) as usize] += state_prob;
            bwd_probs[segs.seq(cluster, h) as usize] += state_prob;
        }
        normalize(fwd_probs);
        normalize(bwd_probs);
    }

    fn set_allele_probs(&mut self, allele_probs: &mut [f32]) {
        let segs = self.data.ref_segments();
        let markers = self.data.markers();
        let n_clusters = self.n_clusters;

        // markers before the first cluster start take segment 0's
        // backward-side sequence probabilities
        let first_start = segs.cluster_start(0);
        let threshold = Self::SEQ_PROB_THRESHOLD_FACTOR / segs.n_seq(0) as f64;
        for (s, &p) in self.bwd_hap_probs[0].iter().enumerate() {
            if p >= threshold {
                for m in 0..first_start {
                    let index = markers.sum_alleles(m) + segs.allele(0, m, s) as usize;
                    allele_probs[index] += p as f32;
                }
            }
        }

        for c in 1..n_clusters {
            let threshold = Self::SEQ_PROB_THRESHOLD_FACTOR / segs.n_seq(c) as f64;
            let prev_start = segs.cluster_start(c - 1);
            let prev_end = segs.cluster_end(c - 1);
            let cur_start = segs.cluster_start(c);
            for s in 0..segs.n_seq(c) {
                let fwd_p = self.fwd_hap_probs[c - 1][s];
                let bwd_p = self.bwd_hap_probs[c][s];
                let use_fwd = fwd_p >= threshold;
                let use_bwd = bwd_p >= threshold;
                if use_fwd {
                    for m in prev_start..prev_end {
                        let index = markers.sum_alleles(m) + segs.allele(c, m, s) as usize;
                        allele_probs[index] += fwd_p as f32;
                    }
                }
                if use_fwd || use_bwd {
                    for m in prev_end..cur_start {
                        let w = self.data.weight(m);
                        let index = markers.sum_alleles(m) + segs.allele(c, m, s) as usize;
                        allele_probs[index] += (w * fwd_p + (1.0 - w) * bwd_p) as f32;
                    }
                }
            }
        }

        // markers from the last cluster start onward take the last
        // segment's forward-side sequence probabilities
        let last_seg = n_clusters;
        let last_start = segs.cluster_start(n_clusters - 1);
        let threshold = Self::SEQ_PROB_THRESHOLD_FACTOR / segs.n_seq(last_seg) as f64;
        for (s, &p) in self.fwd_hap_probs[n_clusters - 1].iter().enumerate() {
            if p >= threshold {
                for m in last_start..markers.n_markers() {
                    let index = markers.sum_alleles(m) + segs.allele(last_seg, m, s) as usize;
                    allele_probs[index] += p as f32;
                }
            }
        }
    }
}

fn normalize(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}
