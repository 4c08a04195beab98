//! PostgreSQL row store for roadmap plan and progress cells.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
