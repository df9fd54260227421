use std::collections::HashSet;
use std::sync::Arc;

/// An ordered sequence of unique sample identifiers. Equality is by the
/// identifier sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Samples {
    ids: Arc<Vec<String>>,
}

impl Samples {
    pub fn new(ids: Vec<String>) -> Samples {
        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids.iter() {
            if !seen.insert(id.as_str()) {
                panic!("Duplicate sample identifier: {}", id);
            }
        }
        Samples { ids: Arc::new(ids) }
    }

    pub fn n_samples(&self) -> usize {
        self.ids.len()
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|s| s == id)
    }

    /// A new Samples with the listed identifiers removed, together with the
    /// retained original indices.
    pub fn exclude(&self, excluded: &HashSet<String>) -> (Samples, Vec<usize>) {
        let mut kept_ids = Vec::new();
        let mut kept_indices = Vec::new();
        for (i, id) in self.ids.iter().enumerate() {
            if !excluded.contains(id) {
                kept_ids.push(id.clone());
                kept_indices.push(i);
            }
        }
        (Samples::new(kept_ids), kept_indices)
    }
}
