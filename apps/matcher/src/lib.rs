//! CV ↔ job matching engine: retrieves candidates, scores each pair across five
//! weighted dimensions in parallel, and returns a ranked, thresholded shortlist.

pub mod analyzers;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod executor;
pub mod llm_client;
pub mod matching;
pub mod models;
pub mod repository;
pub mod scoring;
