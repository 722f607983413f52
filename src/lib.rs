pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod engine;
pub mod math;
pub mod output;
pub mod risk;
pub mod types;
