//! Asynchronous pipeline turning chart images into accessible summaries,
//! data tables and integration code.

pub mod analysis;
pub mod api;
pub mod codegen;
pub mod config;
pub mod constants;
pub mod core;
pub mod db;
pub mod errors;
pub mod event;
pub mod schema;
pub mod templates;
pub mod utils;
