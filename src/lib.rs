//! e-cidadania: spaces, proposals and news for citizen participation.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod forms;
pub mod messages;
pub mod models;
pub mod services;
