use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use hashlink::LinkedHashMap;

use crate::annotator::marker_annotation::GenotypeStats;
use crate::estimation::ibd_segment::IbdSegment;
use crate::estimation::vcf_writer;
use crate::model::genotype_values::GenotypeValues;
use crate::model::samples::Samples;
use crate::utils::errors::ImputationError;
use crate::utils::format_utils::format_trimmed;
use crate::window::current_data::CurrentData;

/// Appends per-window output records to the VCF, IBD, and HBD files.
///
/// The writer is single-threaded and driven in window order. Output for a
/// window is restricted to its own splice region, so the concatenation
/// across windows covers each marker exactly once. IBD segments reaching
/// into the next window's splice region are buffered by haplotype pair and
/// merged with their continuation when the next window reports it.
pub struct WindowWriter {
    samples: Samples,
    vcf: BufWriter<File>,
    ibd: BufWriter<File>,
    hbd: BufWriter<File>,
    ibd_buffer: LinkedHashMap<(usize, usize), IbdSegment>,
    // chromosome names seen so far; buffered segments outlive the window
    // that named their chromosome
    chrom_names: HashMap<usize, String>,
    closed: bool,
}

impl WindowWriter {
    /// Create `{prefix}.vcf`, `{prefix}.ibd`, and `{prefix}.hbd`,
    /// truncating existing files, and write the VCF header.
    pub fn new(
        out_prefix: &Path,
        source: &str,
        samples: Samples,
        gprobs: bool,
    ) -> io::Result<WindowWriter> {
        let open = |suffix: &str| -> io::Result<BufWriter<File>> {
            let mut path = out_prefix.as_os_str().to_owned();
            path.push(suffix);
            Ok(BufWriter::new(File::create(path)?))
        };
        let mut vcf = open(".vcf")?;
        vcf_writer::write_header(&mut vcf, source, &samples, gprobs)?;
        Ok(WindowWriter {
            samples,
            vcf,
            ibd: open(".ibd")?,
            hbd: open(".hbd")?,
            ibd_buffer: LinkedHashMap::new(),
            chrom_names: HashMap::new(),
            closed: false,
        })
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    fn assert_open(&self) {
        if self.closed {
            panic!(
                "{}",
                ImputationError::WriterStateError(String::from(
                    "Operation on a closed window writer"
                ))
            );
        }
    }

    /// Append records for the window's splice region from phased
    /// per-haplotype allele probabilities. With `imputed` false only the
    /// target-genotyped markers of the region are written.
    pub fn print(
        &mut self,
        cd: &CurrentData,
        allele_probs: &[Vec<f32>],
        imputed: bool,
        gprobs: bool,
    ) -> io::Result<()> {
        self.assert_open();
        assert_eq!(
            allele_probs.len(),
            2 * self.samples.n_samples(),
            "One allele probability array per target haplotype is required"
        );
        let markers = cd.markers();
        for m in cd.prev_splice()..cd.next_splice() {
            if !imputed && !cd.marker_indices().contains(&m) {
                continue;
            }
            let marker = markers.marker(m);
            let n_alleles = marker.n_alleles();
            let base = markers.sum_alleles(m);
            let hap_probs = |hap: usize| -> Vec<f64> {
                allele_probs[hap][base..base + n_alleles]
                    .iter()
                    .map(|&p| p as f64)
                    .collect()
            };

            let mut stats = GenotypeStats::new(n_alleles);
            for s in 0..self.samples.n_samples() {
                stats.add_sample_allele_probs(&hap_probs(2 * s), &hap_probs(2 * s + 1));
            }
            vcf_writer::write_record_start(&mut self.vcf, marker, &stats, gprobs)?;
            for s in 0..self.samples.n_samples() {
                vcf_writer::write_phased_sample(
                    &mut self.vcf,
                    &hap_probs(2 * s),
                    &hap_probs(2 * s + 1),
                    gprobs,
                )?;
            }
            writeln!(self.vcf)?;
        }
        self.vcf.flush()
    }

    /// Append records for the window's target markers from unordered
    /// genotype probabilities, with GT:DS:GP fields.
    pub fn print_gv(&mut self, cd: &CurrentData, gv: &GenotypeValues) -> io::Result<()> {
        self.assert_open();
        assert_eq!(
            gv.markers(),
            cd.target_markers(),
            "Genotype values are not aligned on the window's target markers"
        );
        for t in cd.prev_target_splice()..cd.next_target_splice() {
            let marker = gv.markers().marker(t);
            let n_alleles = marker.n_alleles();
            let mut stats = GenotypeStats::new(n_alleles);
            for s in 0..self.samples.n_samples() {
                stats.add_sample_gt_probs(gv.sample_values(t, s));
            }
            vcf_writer::write_record_start(&mut self.vcf, marker, &stats, true)?;
            for s in 0..self.samples.n_samples() {
                vcf_writer::write_unphased_sample(&mut self.vcf, gv.sample_values(t, s), n_alleles)?;
            }
            writeln!(self.vcf)?;
        }
        self.vcf.flush()
    }

    /// Route the window's raw IBD segments: merge continuations of
    /// buffered segments, emit segments ending in this window's splice
    /// region, and buffer segments reaching into the next window's region.
    /// The buffer is replaced wholesale; a chromosome change flushes
    /// leftover segments as terminal records of the previous chromosome.
    pub fn print_ibd(
        &mut self,
        cd: &CurrentData,
        ibd_map: LinkedHashMap<(usize, usize), Vec<IbdSegment>>,
    ) -> io::Result<()> {
        self.assert_open();
        let window_chrom = cd.markers().marker(0).chrom_index();
        self.chrom_names
            .entry(window_chrom)
            .or_insert_with(|| cd.markers().marker(0).chrom().to_string());
        let stale: Vec<(usize, usize)> = self
            .ibd_buffer
            .iter()
            .filter(|(_, seg)| seg.chrom_index != window_chrom)
            .map(|(key, _)| *key)
            .collect();
        for key in stale {
            let seg = self.ibd_buffer.remove(&key).unwrap();
            self.write_segment(&seg)?;
        }

        let n_target_markers = cd.n_target_markers();
        let mut next_buffer: LinkedHashMap<(usize, usize), IbdSegment> = LinkedHashMap::new();
        for (key, segments) in ibd_map {
            for segment in segments {
                let segment = if segment.start_index == 0 {
                    match self.ibd_buffer.remove(&key) {
                        Some(buffered) => IbdSegment::merge(&buffered, &segment),
                        None => segment,
                    }
                } else {
                    segment
                };
                let ends_here = segment.end_index + 1 >= cd.prev_target_splice()
                    && (cd.next_target_splice() == n_target_markers
                        || segment.end_index + 1 < cd.next_target_splice());
                if ends_here {
                    self.write_segment(&segment)?;
                } else if segment.start_index < cd.next_target_overlap() as i64 {
                    next_buffer.insert(key, segment);
                }
            }
        }
        self.ibd_buffer = next_buffer;
        self.ibd.flush()?;
        self.hbd.flush()
    }

    fn write_segment(&mut self, segment: &IbdSegment) -> io::Result<()> {
        let chrom = self
            .chrom_names
            .get(&segment.chrom_index)
            .expect("Chromosome was named by the window that produced the segment");
        let out = if segment.is_hbd() {
            &mut self.hbd
        } else {
            &mut self.ibd
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.samples.id(segment.hap1 / 2),
            segment.hap1 % 2 + 1,
            self.samples.id(segment.hap2 / 2),
            segment.hap2 % 2 + 1,
            chrom,
            segment.start_pos,
            segment.end_pos,
            format_trimmed(segment.score, 2)
        )
    }

    /// Flush and close all files. Segments still buffered are terminal
    /// segments of the final chromosome and are written out first.
    pub fn close(&mut self) -> io::Result<()> {
        self.assert_open();
        let keys: Vec<(usize, usize)> = self.ibd_buffer.keys().copied().collect();
        for key in keys {
            let seg = self.ibd_buffer.remove(&key).unwrap();
            self.write_segment(&seg)?;
        }
        self.vcf.flush()?;
        self.ibd.flush()?;
        self.hbd.flush()?;
        self.closed = true;
        Ok(())
    }
}
