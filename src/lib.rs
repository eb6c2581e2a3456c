//! mikrotik-gateway - an HTTP gateway for blocking web sites at the router
//!
//! This crate provides a proxy server that forwards management API calls to a
//! MikroTik router and translates "block this domain" requests into static
//! DNS redirections on that router.

pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod server;
pub mod upstream;
