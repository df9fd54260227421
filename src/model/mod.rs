pub mod genetic_map;
pub mod genotype_values;
pub mod hap_pairs;
pub mod marker;
pub mod markers;
pub mod samples;
