//! Blog feed loading for the landing page.
//!
//! - [`parser`] - RSS/Atom parsing using the `feed-rs` crate, reduced to the
//!   fields the page shows
//! - [`fetcher`] - HTTP retrieval with a timeout and a body size limit
//!
//! # Example
//!
//! ```ignore
//! use academy_landing::feed::FeedLoader;
//!
//! let loader = FeedLoader::new(reqwest::Client::new(), "https://blog.example.com/rss/", 3);
//! let items = loader.load().await; // empty on any failure
//! ```

mod fetcher;
mod parser;

pub use fetcher::{FeedLoader, FetchError};
pub use parser::{format_published, parse_items, FeedItem};
