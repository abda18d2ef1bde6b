pub mod board;
pub mod catalog;
pub mod engine;
pub mod filter;
pub mod parser;
pub mod render;

pub use crate::domain::model::{Delimiter, ParsedFeed, Record};
pub use crate::domain::ports::{FeedSource, PostRenderHook, Storage, UiSurface};
pub use crate::utils::error::Result;
pub use filter::Criteria;
