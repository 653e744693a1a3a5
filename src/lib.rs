pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testing;
