pub mod address;
pub mod catalog;
pub mod consolidation;
pub mod dates;
pub mod etl;
pub mod mappers;
pub mod packaging;
pub mod pipeline;
pub mod routing;
pub mod sheet;

pub use crate::domain::model::{ConsolidationReport, ShipmentRow};
pub use crate::domain::orders::OrderSheet;
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
