#[macro_use]
pub mod macros;

pub mod api;
pub mod app;
pub mod chrono_util;
pub mod config;
pub mod credentials;
pub mod fetcher;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod usage_tracker;
