// src/extractors/mod.rs
pub mod classify;
pub mod dom;
pub mod locator;
pub mod patterns;
pub mod section;
pub mod table;

// Re-export the types the driver works with
#[allow(unused_imports)]
pub use locator::IndexEntry;
#[allow(unused_imports)]
pub use patterns::{PatternRegistry, PhraseSets};
#[allow(unused_imports)]
pub use section::AcquisitionScanner;
