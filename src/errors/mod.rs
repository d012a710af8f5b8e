//! Domain-specific error types for menuseed
//!
//! Errors are split by the boundary they come from, so callers can tell a
//! backend failure apart from a bad dataset or a recoverable image problem.
//!
//! # Error Categories
//!
//! - **StoreError**: document store and file bucket calls (list, create, delete)
//! - **ImageError**: fetching and re-uploading a menu item image; always
//!   recovered by falling back to another image URL
//! - **SeedError**: run-level failures of the dataset loader, carrying the phase
//!   that failed
//!
//! # Examples
//!
//! ```rust
//! use menuseed::errors::{SeedError, StoreError};
//! use menuseed::data_loader::Phase;
//!
//! let err = SeedError::store(
//!     Phase::Categories,
//!     StoreError::Status {
//!         operation: "create document".to_string(),
//!         status: 401,
//!         message: "missing scope".to_string(),
//!     },
//! );
//!
//! assert!(err.is_store_error());
//! assert_eq!(err.phase(), Some(Phase::Categories));
//! ```

pub mod image;
pub mod seed;
pub mod store;

pub use image::ImageError;
pub use seed::{ReferenceKind, SeedError};
pub use store::StoreError;

/// Result type alias for backend operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for loader operations
pub type SeedResult<T> = Result<T, SeedError>;
