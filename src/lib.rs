pub mod common;
pub mod config;
pub mod data_loader;
pub mod dataset;
pub mod errors;
pub mod images;
pub mod store;

pub use config::SeedConfig;
pub use data_loader::{DatasetLoader, SeedReport};
pub use dataset::Dataset;
