//! Shared utilities.

pub mod url;

pub use url::{host_variants, normalize_domain, normalize_url};
