//! File actions module.
//!
//! # Deletion
//!
//! The delete module removes selected members of a cached duplicate group:
//! - Permanent deletion with `std::fs::remove_file`
//! - At least one member of every group is always kept
//! - Files that cannot be removed stay in the group
//! - The cached result is republished with shrunk or dissolved groups
//!
//! ```no_run
//! use sweepdupe::actions::delete::permanent_delete;
//! use std::path::Path;
//!
//! permanent_delete(Path::new("/path/to/duplicate.txt")).unwrap();
//! ```

pub mod delete;

pub use delete::{delete_group_members, BatchDeleteResult, DeleteError};
