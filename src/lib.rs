pub mod actions;
pub mod authorize;
pub mod caller;
pub mod catalog;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod routes;
pub mod spotify;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;
