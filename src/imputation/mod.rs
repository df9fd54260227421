pub mod imputation_data;
pub mod li_stephens_hmm;
