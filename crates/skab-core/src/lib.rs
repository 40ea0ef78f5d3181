//! SKAB core: sensor records, loading and validation, dataset split, PCA scoring.

pub mod error;
pub mod record;
pub mod validation;
pub mod loader;
pub mod dataset;
pub mod features;
pub mod pipeline;
pub mod pca;
pub mod report;
pub mod settings;

pub use error::*;
pub use record::*;
pub use validation::*;
pub use loader::*;
pub use dataset::*;
pub use features::*;
pub use pipeline::*;
pub use pca::*;
pub use report::*;
pub use settings::*;

#[cfg(test)]
mod tests_pipeline;
