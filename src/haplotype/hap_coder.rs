use hashlink::LinkedHashMap;

use crate::model::hap_pairs::SampleHapPairs;

/// Assigns each reference and target haplotype a small integer labelling
/// its distinct allele sequence over a contiguous marker range.
///
/// Reference and target codes share one vocabulary: a target haplotype
/// whose sequence occurs in the reference panel receives that reference
/// code, and one that matches no reference haplotype receives a fresh code
/// above all reference codes.
pub struct HaplotypeCoder<'a> {
    ref_haps: &'a SampleHapPairs,
    target_haps: &'a SampleHapPairs,
}

impl<'a> HaplotypeCoder<'a> {
    /// Both hap-pair sets must be aligned on the same marker list.
    pub fn new(ref_haps: &'a SampleHapPairs, target_haps: &'a SampleHapPairs) -> HaplotypeCoder<'a> {
        assert_eq!(
            ref_haps.n_markers(),
            target_haps.n_markers(),
            "Reference and target marker counts differ"
        );
        HaplotypeCoder {
            ref_haps,
            target_haps,
        }
    }

    /// Sequence codes over the marker range [start, end), returned as
    /// (reference codes, target codes) indexed by haplotype.
    pub fn code_range(&self, start: usize, end: usize) -> (Vec<u32>, Vec<u32>) {
        assert!(start < end && end <= self.ref_haps.n_markers());
        let mut vocabulary: LinkedHashMap<Vec<u8>, u32> = LinkedHashMap::new();

        let ref_codes = (0..self.ref_haps.n_haps())
            .map(|h| {
                let key: Vec<u8> = (start..end).map(|m| self.ref_haps.allele(m, h)).collect();
                let next = vocabulary.len() as u32;
                *vocabulary.entry(key).or_insert(next)
            })
            .collect();

        let target_codes = (0..self.target_haps.n_haps())
            .map(|h| {
                let key: Vec<u8> = (start..end)
                    .map(|m| self.target_haps.allele(m, h))
                    .collect();
                let next = vocabulary.len() as u32;
                *vocabulary.entry(key).or_insert(next)
            })
            .collect();

        (ref_codes, target_codes)
    }
}
