//! Core record types, encoders and provider abstractions

pub mod config;
pub mod dates;
pub mod download;
pub mod format;
pub mod log;
pub mod period;
pub mod provider;
pub mod quote;

// Re-export main types for cleaner imports
pub use format::OutputFormat;
pub use period::Period;
pub use provider::{FetchRequest, MarketProvider, QuoteProvider, Source};
pub use quote::{Bar, Quote, Quotes};
