//! Global News - an RSS/Atom aggregator
//!
//! Fetches a list of news feeds, merges their entries into one deduplicated,
//! newest-first list of articles and writes it as a JSON document for a
//! static front-end.

pub mod article;
pub mod config;
pub mod dedup;
pub mod fetcher;
pub mod output;
pub mod pipeline;
pub mod translator;
