//! Entity data exchanged with the scoring engines.

pub mod hash;
pub mod report;

pub use hash::{HashFamily, HashParseError, PerceptualHash, PerceptualHashSet};
pub use report::ReportFields;
