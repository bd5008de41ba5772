//! Output formatters for scan results.
//!
//! - [`text`]: human-readable listing with sizes from `bytesize`
//! - [`json`]: machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use sweepdupe::duplicates::ScanResult;
//! use sweepdupe::output::JsonOutput;
//!
//! let result = ScanResult::empty();
//! println!("{}", JsonOutput::new(&result).to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;
