//! Utility modules
//!
//! - Habitat names: splitting "<Broad habitat> - <Habitat name>" descriptions
//! - Output: six-space JSON and atomic file replacement

pub mod habitat_names;
pub mod output;

// Re-export commonly used functions
pub use habitat_names::split_description;
pub use output::{to_pretty_json, write_atomic, write_json};
