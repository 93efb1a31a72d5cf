//! Agora community server library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod auth;
pub mod badges;
pub mod categories;
pub mod config;
pub mod dm;
pub mod error;
pub mod groups;
pub mod notify;
pub mod posts;
pub mod routes;
pub mod state;
pub mod storage;
pub mod stories;
pub mod subscriber;
pub mod ws;
