// convoscan/src/ui/mod.rs
//! Terminal rendering for scan reports and rule listings.

pub mod output_format;
