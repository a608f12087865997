pub mod ai;
pub mod commands;
pub mod config;
pub mod duration;
pub mod error;
pub mod export;
pub mod linking;
pub mod logging;
pub mod models;
pub mod notify;
pub mod seed;
pub mod storage;
pub mod store;
pub mod tui;
pub mod views;

pub use error::{Error, Result};
