use std::collections::HashMap;

use crate::model::marker::Marker;

/// A monotone mapping from (chromosome, base-pair position) to genetic
/// position in centiMorgans.
pub trait GeneticMap: Sync + Send {
    fn gen_pos(&self, chrom_index: usize, pos: u64) -> f64;

    fn gen_pos_marker(&self, marker: &Marker) -> f64 {
        self.gen_pos(marker.chrom_index(), marker.pos())
    }
}

/// Genetic map defined by per-chromosome anchor rows (bp, cM), linearly
/// interpolated between anchors. Positions beyond the anchored range are
/// extrapolated with the slope of the nearest two anchors.
#[derive(Debug, Clone, Default)]
pub struct InterpolatedGeneticMap {
    // per chromosome: parallel, bp-sorted anchor arrays
    anchors: HashMap<usize, (Vec<u64>, Vec<f64>)>,
}

impl InterpolatedGeneticMap {
    pub fn new() -> InterpolatedGeneticMap {
        InterpolatedGeneticMap {
            anchors: HashMap::new(),
        }
    }

    pub fn from_anchors(rows: Vec<(usize, u64, f64)>) -> InterpolatedGeneticMap {
        let mut map = InterpolatedGeneticMap::new();
        for (chrom, bp, cm) in rows {
            map.add_anchor(chrom, bp, cm);
        }
        map
    }

    pub fn add_anchor(&mut self, chrom_index: usize, bp: u64, cm: f64) {
        let (positions, cms) = self
            .anchors
            .entry(chrom_index)
            .or_insert_with(|| (Vec::new(), Vec::new()));
        if let Some(&last_bp) = positions.last() {
            if bp <= last_bp {
                panic!(
                    "Genetic map anchors out of order on chromosome {}: {} after {}",
                    chrom_index, bp, last_bp
                );
            }
            if cm < *cms.last().unwrap() {
                panic!(
                    "Genetic map is decreasing on chromosome {} at {} bp",
                    chrom_index, bp
                );
            }
        }
        positions.push(bp);
        cms.push(cm);
    }
}

impl GeneticMap for InterpolatedGeneticMap {
    fn gen_pos(&self, chrom_index: usize, pos: u64) -> f64 {
        let (positions, cms) = match self.anchors.get(&chrom_index) {
            Some(rows) => rows,
            None => panic!("No genetic map anchors for chromosome {}", chrom_index),
        };
        if positions.len() < 2 {
            panic!(
                "Chromosome {} has fewer than two genetic map anchors",
                chrom_index
            );
        }
        // index of the anchor pair that brackets pos; the first or last
        // pair doubles as the extrapolation slope beyond the anchored range
        let hi = match positions.binary_search(&pos) {
            Ok(i) => return cms[i],
            Err(i) => i.clamp(1, positions.len() - 1),
        };
        let lo = hi - 1;
        let slope = (cms[hi] - cms[lo]) / (positions[hi] - positions[lo]) as f64;
        cms[lo] + slope * (pos as f64 - positions[lo] as f64)
    }
}

/// A map assigning a constant centiMorgan per megabase rate everywhere.
/// Used when no map file is supplied.
#[derive(Debug, Clone, Copy)]
pub struct UniformGeneticMap {
    cm_per_mb: f64,
}

impl UniformGeneticMap {
    pub fn new(cm_per_mb: f64) -> UniformGeneticMap {
        UniformGeneticMap { cm_per_mb }
    }
}

impl Default for UniformGeneticMap {
    fn default() -> Self {
        UniformGeneticMap { cm_per_mb: 1.0 }
    }
}

impl GeneticMap for UniformGeneticMap {
    fn gen_pos(&self, _chrom_index: usize, pos: u64) -> f64 {
        self.cm_per_mb * pos as f64 * 1e-6
    }
}
