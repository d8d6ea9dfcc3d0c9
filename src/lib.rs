pub mod clients;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod query;
pub mod repository;
pub mod state;
pub mod transform;
