pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{HtmlPageSurface, HttpFeedSource, LocalStorage};
pub use crate::config::DeploymentConfig;
pub use crate::core::board::{CatalogBoard, CatalogView, Dispatcher, EventKind, InputEvent};
pub use crate::core::catalog::{Catalog, CatalogLoader, LoaderSettings};
pub use crate::core::engine::{CatalogEngine, OutputFormat, RenderedCatalog};
pub use crate::core::filter::{Criteria, FilterSpec, WeightBucket};
pub use crate::core::parser::{encode, parse, parse_with_filter, RowFilter};
pub use crate::domain::model::{Delimiter, ParsedFeed, Record};
pub use crate::utils::error::{CatalogError, Result};
