use std::io::{self, Write};

use chrono::Local;
use itertools::Itertools;

use crate::annotator::marker_annotation::{GenotypeStats, VcfAnnotations};
use crate::model::marker::Marker;
use crate::model::samples::Samples;
use crate::utils::format_utils::{format_fixed, format_sig_digits, format_trimmed};

/// Number of fraction digits of the fixed-format AR2/DR2 fields.
const R2_FRACTION_DIGITS: usize = 2;
/// Number of fraction digits of the trimmed DS/GP fields.
const PROB_FRACTION_DIGITS: usize = 2;
/// Significant digits of the AF field.
const AF_SIG_DIGITS: i32 = 2;

/// Write the VCF 4.2 header block: file format, file date, source, the
/// enabled INFO/FORMAT definitions, and the column line.
pub fn write_header<W: Write>(
    out: &mut W,
    source: &str,
    samples: &Samples,
    gprobs: bool,
) -> io::Result<()> {
    writeln!(out, "##fileformat=VCFv4.2")?;
    writeln!(out, "##filedate={}", Local::now().format("%Y%m%d"))?;
    writeln!(out, "##source=\"{}\"", source)?;
    writeln!(out, "{}", VcfAnnotations::AlleleFrequency.header_line())?;
    writeln!(out, "{}", VcfAnnotations::AllelicR2.header_line())?;
    writeln!(out, "{}", VcfAnnotations::DoseR2.header_line())?;
    writeln!(out, "{}", VcfAnnotations::Genotype.header_line())?;
    writeln!(out, "{}", VcfAnnotations::Dose.header_line())?;
    if gprobs {
        writeln!(out, "{}", VcfAnnotations::GenotypeProbs.header_line())?;
    }
    write!(out, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT")?;
    for id in samples.ids() {
        write!(out, "\t{}", id)?;
    }
    writeln!(out)
}

/// Write the fixed fields and the INFO/FORMAT columns of one record.
pub fn write_record_start<W: Write>(
    out: &mut W,
    marker: &Marker,
    stats: &GenotypeStats,
    gprobs: bool,
) -> io::Result<()> {
    write!(
        out,
        "{}\t{}\t{}\t{}\t{}\t.\tPASS\t",
        marker.chrom(),
        marker.pos(),
        marker.id(),
        marker.allele(0),
        marker.alleles()[1..].iter().join(",")
    )?;
    let af = (1..marker.n_alleles())
        .map(|a| format_sig_digits(stats.allele_freq(a), AF_SIG_DIGITS))
        .join(",");
    write!(
        out,
        "AR2={};DR2={};AF={}",
        format_fixed(stats.allelic_r2(), R2_FRACTION_DIGITS),
        format_fixed(stats.dose_r2(), R2_FRACTION_DIGITS),
        af
    )?;
    if gprobs {
        write!(out, "\tGT:DS:GP")
    } else {
        write!(out, "\tGT:DS")
    }
}

/// One sample's GT:DS[:GP] column from phased per-haplotype allele
/// probabilities. The genotype separator is the phased `|`.
pub fn write_phased_sample<W: Write>(
    out: &mut W,
    hap1_probs: &[f64],
    hap2_probs: &[f64],
    gprobs: bool,
) -> io::Result<()> {
    let a1 = argmax(hap1_probs);
    let a2 = argmax(hap2_probs);
    let n_alleles = hap1_probs.len();
    write!(out, "\t{}|{}:", a1, a2)?;
    let dose = (1..n_alleles)
        .map(|a| format_trimmed(hap1_probs[a] + hap2_probs[a], PROB_FRACTION_DIGITS))
        .join(",");
    write!(out, "{}", dose)?;
    if gprobs {
        write!(out, ":")?;
        let mut first = true;
        for a2 in 0..n_alleles {
            for a1 in 0..=a2 {
                let p = if a1 == a2 {
                    hap1_probs[a1] * hap2_probs[a2]
                } else {
                    hap1_probs[a1] * hap2_probs[a2] + hap1_probs[a2] * hap2_probs[a1]
                };
                if !first {
                    write!(out, ",")?;
                }
                write!(out, "{}", format_trimmed(p, PROB_FRACTION_DIGITS))?;
                first = false;
            }
        }
    }
    Ok(())
}

/// One sample's GT:DS:GP column from unordered genotype probabilities.
/// The genotype separator is the unphased `/`.
pub fn write_unphased_sample<W: Write>(
    out: &mut W,
    gt_probs: &[f64],
    n_alleles: usize,
) -> io::Result<()> {
    let sum: f64 = gt_probs.iter().sum();
    let norm = if sum > 0.0 { sum } else { 1.0 };
    let best = argmax(gt_probs);
    let (a1, a2) = genotype_alleles(best);
    write!(out, "\t{}/{}:", a1, a2)?;

    // expected dose per ALT allele from the genotype marginals
    let mut dose = vec![0f64; n_alleles];
    let mut gt = 0usize;
    for a2 in 0..n_alleles {
        for a1 in 0..=a2 {
            dose[a1] += gt_probs[gt] / norm;
            dose[a2] += gt_probs[gt] / norm;
            gt += 1;
        }
    }
    let ds = (1..n_alleles)
        .map(|a| format_trimmed(dose[a], PROB_FRACTION_DIGITS))
        .join(",");
    write!(out, "{}:", ds)?;
    let gp = gt_probs
        .iter()
        .map(|p| format_trimmed(p / norm, PROB_FRACTION_DIGITS))
        .join(",");
    write!(out, "{}", gp)
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

fn genotype_alleles(gt: usize) -> (usize, usize) {
    let mut a2 = 0usize;
    while (a2 + 1) * (a2 + 2) / 2 <= gt {
        a2 += 1;
    }
    (gt - a2 * (a2 + 1) / 2, a2)
}
