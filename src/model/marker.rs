use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable genomic marker: a chromosome index that is stable within a
/// run, a one-based base-pair position, an optional identifier, and the
/// list of observed alleles with the reference allele first.
///
/// Two markers are equal iff chromosome, position, id, and allele list are
/// all equal. Markers order by (chromosome, position).
#[derive(Debug, Clone)]
pub struct Marker {
    chrom_index: usize,
    chrom: Arc<String>,
    pos: u64,
    id: Option<String>,
    alleles: Vec<String>,
}

impl Marker {
    pub fn new(
        chrom_index: usize,
        chrom: Arc<String>,
        pos: u64,
        id: Option<String>,
        alleles: Vec<String>,
    ) -> Marker {
        if alleles.len() < 2 {
            panic!(
                "Marker at {}:{} must have at least two alleles, found {}",
                chrom, pos, alleles.len()
            );
        }
        Marker {
            chrom_index,
            chrom,
            pos,
            id,
            alleles,
        }
    }

    pub fn chrom_index(&self) -> usize {
        self.chrom_index
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn id(&self) -> &str {
        match &self.id {
            Some(id) => id,
            None => ".",
        }
    }

    pub fn alleles(&self) -> &[String] {
        &self.alleles
    }

    pub fn allele(&self, index: usize) -> &str {
        &self.alleles[index]
    }

    pub fn n_alleles(&self) -> usize {
        self.alleles.len()
    }

    /// Number of unordered diploid genotypes, indexed with a2 >= a1:
    /// genotype (a1, a2) has index a2*(a2+1)/2 + a1.
    pub fn n_genotypes(&self) -> usize {
        let n = self.alleles.len();
        n * (n + 1) / 2
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.chrom_index == other.chrom_index
            && self.pos == other.pos
            && self.id == other.id
            && self.alleles == other.alleles
    }
}

impl Eq for Marker {}

impl Hash for Marker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chrom_index.hash(state);
        self.pos.hash(state);
    }
}

impl Ord for Marker {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.chrom_index, self.pos).cmp(&(other.chrom_index, other.pos))
    }
}

impl PartialOrd for Marker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chrom, self.pos)
    }
}

/// Index of an unordered diploid genotype; the allele order is ignored.
pub fn genotype_index(a1: usize, a2: usize) -> usize {
    let (lo, hi) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
    hi * (hi + 1) / 2 + lo
}
