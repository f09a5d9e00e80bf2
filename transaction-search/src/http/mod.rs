//! HTTP surface of the transaction search service.

pub mod cache;
pub mod handlers;
pub mod routes;
pub mod types;

#[cfg(test)]
mod testing;

pub use cache::QueryCache;
pub use handlers::AppState;
pub use routes::create_router;
