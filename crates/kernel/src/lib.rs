//! Lexsite kernel library.
//!
//! Bilingual (English/Vietnamese) law firm website with an admin dashboard
//! and a JSON content API. The `lexsite` binary wires these modules into a
//! server; integration tests build the same router with in-memory sessions.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod file;
pub mod form;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod theme;
