pub mod hap_coder;
pub mod ref_hap_seg;
pub mod ref_hap_segs;
