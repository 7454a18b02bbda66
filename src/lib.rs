pub mod announcer;
pub mod assets;
pub mod classifier;
pub mod config;
pub mod database;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod sources;
pub mod utils;
pub mod web;
