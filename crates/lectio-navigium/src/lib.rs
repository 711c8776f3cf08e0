//! Client for the navigium.de Latin dictionary.
//!
//! Fetches result pages, parses them into [`lectio_core::Meaning`] records
//! and keeps every answer in memory for the life of the process.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod parse;

pub use cache::MemoryCache;
pub use client::NavigiumClient;
pub use config::ClientConfig;
pub use error::{NavigiumError, Result};
