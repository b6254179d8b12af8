//! Page fetching and per-page analysis.

pub mod extractor;
pub mod http_client;
pub mod link_checker;

pub use extractor::extract_page_signals;
pub use http_client::HttpClient;
pub use link_checker::{check_links, LinkCheckReport};
