//! CSV boundary: metered intervals in, simulated intervals and buckets out.

pub mod export;
pub mod import;
