pub mod ibd_segment;
pub mod vcf_writer;
pub mod window_writer;
