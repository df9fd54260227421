use hashlink::LinkedHashMap;
use ndarray::Array2;

use crate::model::hap_pairs::SampleHapPairs;

/// One contiguous reference-marker segment: the map from reference
/// haplotype to sequence index, and the allele matrix of the distinct
/// sequence representatives.
#[derive(Debug, Clone)]
pub struct RefHapSegment {
    start: usize,
    end: usize,
    hap_to_seq: Vec<u32>,
    // row = sequence, column = marker offset within [start, end)
    alleles: Array2<u8>,
}

impl RefHapSegment {
    pub fn new(ref_haps: &SampleHapPairs, start: usize, end: usize) -> RefHapSegment {
        assert!(
            start < end && end <= ref_haps.n_markers(),
            "Invalid segment bounds [{}, {}) over {} markers",
            start,
            end,
            ref_haps.n_markers()
        );
        let mut vocabulary: LinkedHashMap<Vec<u8>, u32> = LinkedHashMap::new();
        let hap_to_seq: Vec<u32> = (0..ref_haps.n_haps())
            .map(|h| {
                let key: Vec<u8> = (start..end).map(|m| ref_haps.allele(m, h)).collect();
                let next = vocabulary.len() as u32;
                *vocabulary.entry(key).or_insert(next)
            })
            .collect();

        let n_seq = vocabulary.len();
        let mut alleles = Array2::zeros((n_seq, end - start));
        for (row, key) in vocabulary.keys().enumerate() {
            for (col, allele) in key.iter().enumerate() {
                alleles[[row, col]] = *allele;
            }
        }
        RefHapSegment {
            start,
            end,
            hap_to_seq,
            alleles,
        }
    }

    /// First reference-marker index of the segment.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last reference-marker index of the segment.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn n_markers(&self) -> usize {
        self.end - self.start
    }

    /// Number of distinct allele sequences in the segment.
    pub fn n_seq(&self) -> usize {
        self.alleles.nrows()
    }

    /// Sequence index of a reference haplotype.
    pub fn seq(&self, hap: usize) -> u32 {
        self.hap_to_seq[hap]
    }

    /// Allele of sequence `seq` at offset `marker` within the segment.
    pub fn allele(&self, marker: usize, seq: usize) -> u8 {
        self.alleles[[seq, marker]]
    }
}
