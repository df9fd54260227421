use std::cmp::min;

use crate::model::genetic_map::GeneticMap;
use crate::window::emission::{EmissionSource, MarkerEmission};

/// A sliding window over an ordered stream of per-marker emissions.
///
/// The iterator keeps the current window, a one-record lookahead, the
/// actual overlap with the previous window, and a cumulative count of
/// non-overlap markers emitted so far. Windows never split markers that
/// share a base-pair position, and never span a chromosome boundary.
pub struct MarkerWindowIterator<S: EmissionSource> {
    source: S,
    window: Vec<MarkerEmission>,
    lookahead: Option<MarkerEmission>,
    overlap: usize,
    cum_marker_cnt: usize,
}

impl<S: EmissionSource> MarkerWindowIterator<S> {
    pub fn new(mut source: S) -> MarkerWindowIterator<S> {
        let lookahead = source.next_emission();
        MarkerWindowIterator {
            source,
            window: Vec::new(),
            lookahead,
            overlap: 0,
            cum_marker_cnt: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The emissions of the current window, in marker order.
    pub fn window(&self) -> &[MarkerEmission] {
        &self.window
    }

    /// Actual overlap with the previous window, recorded at the last
    /// advance.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Cumulative count of non-overlap markers emitted so far, including
    /// the current window.
    pub fn cum_marker_cnt(&self) -> usize {
        self.cum_marker_cnt
    }

    /// True iff the lookahead is absent or on a different chromosome than
    /// the first record of the current window.
    pub fn last_window_on_chrom(&self) -> bool {
        match (&self.lookahead, self.window.first()) {
            (Some(next), Some(first)) => next.chrom_index() != first.chrom_index(),
            _ => true,
        }
    }

    pub fn can_advance_window(&self) -> bool {
        self.lookahead.is_some()
    }

    /// Advance to the next window of up to `window_size` markers,
    /// requesting `overlap` markers of overlap with the current window.
    pub fn advance_by_size(&mut self, overlap: usize, window_size: usize) {
        assert!(
            overlap < window_size,
            "Window overlap {} must be less than window size {}",
            overlap,
            window_size
        );
        self.advance(overlap, |window, _next| window.len() < window_size);
    }

    /// Advance to the next window spanning up to `cm` centiMorgans.
    pub fn advance_by_cm(&mut self, overlap: usize, cm: f64, map: &dyn GeneticMap) {
        assert!(cm >= 0.0, "Window cM length must be non-negative: {}", cm);
        self.advance(overlap, |window, next| match window.first() {
            Some(first) => {
                map.gen_pos_marker(next.marker())
                    < map.gen_pos_marker(first.marker()) + cm
            }
            None => true,
        });
    }

    fn advance<F>(&mut self, requested_overlap: usize, mut accept: F)
    where
        F: FnMut(&[MarkerEmission], &MarkerEmission) -> bool,
    {
        if !self.can_advance_window() {
            panic!("advance_window called with no further emissions");
        }
        let actual_overlap = self.actual_overlap(requested_overlap);

        // seed the next window with the overlap tail of the current one
        let tail_start = self.window.len() - actual_overlap;
        let mut next_window: Vec<MarkerEmission> = self.window.split_off(tail_start);
        self.window.clear();

        let window_chrom = match next_window.first() {
            Some(first) => first.chrom_index(),
            None => self.lookahead.as_ref().unwrap().chrom_index(),
        };
        while let Some(next) = &self.lookahead {
            if next.chrom_index() != window_chrom || !accept(&next_window, next) {
                break;
            }
            next_window.push(self.lookahead.take().unwrap());
            self.lookahead = self.source.next_emission();
        }
        // markers at one position must not straddle windows
        while let Some(next) = &self.lookahead {
            let last = next_window.last().unwrap();
            if next.chrom_index() != last.chrom_index() || next.pos() != last.pos() {
                break;
            }
            next_window.push(self.lookahead.take().unwrap());
            self.lookahead = self.source.next_emission();
        }

        self.window = next_window;
        self.overlap = actual_overlap;
        self.cum_marker_cnt += self.window.len() - actual_overlap;
        debug!(
            "Advanced window: {} markers, overlap {}, cumulative {}",
            self.window.len(),
            self.overlap,
            self.cum_marker_cnt
        );
    }

    // Overlap actually kept: zero across a chromosome boundary, otherwise
    // the requested count extended while the boundary splits a run of
    // markers at one base-pair position.
    fn actual_overlap(&self, requested: usize) -> usize {
        if self.window.is_empty() || self.last_window_on_chrom() {
            return 0;
        }
        let mut boundary = self.window.len() - min(requested, self.window.len());
        while boundary > 0
            && boundary < self.window.len()
            && self.window[boundary].pos() == self.window[boundary - 1].pos()
        {
            boundary -= 1;
        }
        self.window.len() - boundary
    }
}
