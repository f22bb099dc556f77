// Core types: errors, key material, shared data model

pub mod crypto;
pub mod errors;
pub mod models;
