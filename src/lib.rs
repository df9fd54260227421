#[macro_use]
extern crate log;

pub mod annotator;
pub mod cli;
pub mod estimation;
pub mod haplotype;
pub mod imputation;
pub mod model;
pub mod processing;
pub mod utils;
pub mod window;
