pub mod classifier;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logger;
pub mod pipeline;
pub mod pose;
pub mod technique;
pub mod tracker;
pub mod vector;
