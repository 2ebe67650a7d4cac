pub mod app;
pub mod error;
mod routes;
