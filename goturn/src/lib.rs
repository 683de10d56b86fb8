//! The data pipeline of the GOTURN tracker.
//!
//! It loads VOT-style annotated frame sequences, samples reference/search
//! frame pairs, crops both frames around the reference box and produces
//! normalized image batches with search-area relative regression targets.

mod common;
pub mod config;
pub mod dataset;
pub mod generator;
pub mod loader;
pub mod processor;
pub mod tracker;
