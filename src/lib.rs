//! Macro Util Library
//!
//! Nutrition tracking core: serving parsing, recipe and journal
//! aggregation, and ingredient resolution against a local store and a
//! remote food database.

pub mod build_info;
pub mod config;
pub mod db;
pub mod journal;
pub mod lookup;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod resolve;
pub mod tools;
