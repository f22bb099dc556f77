// Library root for the gatekeeper service

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod core;
pub mod gate;
