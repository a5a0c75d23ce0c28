//! RSS Dashboard - A server-rendered feed dashboard
//!
//! This crate fetches a remote dashboard configuration, loads the RSS feeds
//! its widgets point at, and renders them as a single sanitized HTML page.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod render;
pub mod routes;
pub mod sanitize;
