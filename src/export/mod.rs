pub mod vcf;

pub use vcf::write_vcf;
