use hashlink::LinkedHashMap;

use crate::window::current_data::CurrentData;

/// Sentinel start index of a segment that began in a previous window.
pub const STARTED_IN_PREVIOUS_WINDOW: i64 = -1;

/// An identity-by-descent segment between two target haplotypes.
///
/// `start_index` / `end_index` are target-marker indices within the window
/// that produced the segment; the base-pair endpoints are absolute so a
/// segment can be carried across window boundaries. Haplotypes 2s and
/// 2s + 1 belong to sample s, so a pair on one sample is a
/// homozygosity-by-descent segment.
#[derive(Debug, Clone, PartialEq)]
pub struct IbdSegment {
    pub hap1: usize,
    pub hap2: usize,
    pub start_index: i64,
    pub end_index: usize,
    pub chrom_index: usize,
    pub start_pos: u64,
    pub end_pos: u64,
    pub score: f64,
}

impl IbdSegment {
    pub fn new(
        hap1: usize,
        hap2: usize,
        start_index: i64,
        end_index: usize,
        chrom_index: usize,
        start_pos: u64,
        end_pos: u64,
        score: f64,
    ) -> IbdSegment {
        assert!(hap1 <= hap2, "Haplotype pair must be ordered");
        IbdSegment {
            hap1,
            hap2,
            start_index,
            end_index,
            chrom_index,
            start_pos,
            end_pos,
            score,
        }
    }

    pub fn key(&self) -> (usize, usize) {
        (self.hap1, self.hap2)
    }

    /// True iff both haplotypes belong to one sample.
    pub fn is_hbd(&self) -> bool {
        self.hap1 / 2 == self.hap2 / 2
    }

    /// Merge a segment buffered from the previous window with its
    /// continuation in the current window. The merged segment takes the
    /// earlier start, the later end, the larger score, and the
    /// started-in-previous-window sentinel.
    pub fn merge(buffered: &IbdSegment, continuation: &IbdSegment) -> IbdSegment {
        assert_eq!(buffered.key(), continuation.key());
        assert_eq!(buffered.chrom_index, continuation.chrom_index);
        IbdSegment {
            hap1: buffered.hap1,
            hap2: buffered.hap2,
            start_index: STARTED_IN_PREVIOUS_WINDOW,
            end_index: continuation.end_index,
            chrom_index: buffered.chrom_index,
            start_pos: buffered.start_pos,
            end_pos: continuation.end_pos,
            score: buffered.score.max(continuation.score),
        }
    }
}

/// The external detector that produces raw per-window IBD segments. Only
/// the cross-window merge of its output is handled here.
pub trait IbdSegmentSource {
    fn find_segments(
        &mut self,
        cd: &CurrentData,
    ) -> LinkedHashMap<(usize, usize), Vec<IbdSegment>>;
}
