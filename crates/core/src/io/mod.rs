//! I/O for point feature datasets

mod wals;

pub use wals::{parse_wals_xml, read_wals_feature};
