pub mod config;
pub mod fetch;
pub mod geo;
pub mod infra;
pub mod output;
pub mod predict;
pub mod scoring;
pub mod services;
pub mod summary;
