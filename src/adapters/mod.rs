// Adapters layer: concrete implementations for external systems (http feed, html page, local files).

pub mod http;
pub mod page;
pub mod storage;

pub use http::HttpFeedSource;
pub use page::HtmlPageSurface;
pub use storage::LocalStorage;
