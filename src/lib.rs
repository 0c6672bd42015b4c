// src/lib.rs

//! geoharvest: batch collection of geocoded and tabular public data.

pub mod config;
pub mod error;
pub mod harvest;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
