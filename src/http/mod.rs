//! HTTP surface: router, health, and pull endpoints

pub mod routes;

pub use routes::build_router;
