pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::toml_config::ConsolidatorConfig;
pub use crate::core::{
    catalog::ProductCatalog, consolidation::ConsolidationEngine, etl::EtlEngine,
    pipeline::OrderPipeline,
};
pub use domain::model::{ConsolidationReport, Platform, ShipmentRow};
pub use utils::error::{EtlError, Result};
