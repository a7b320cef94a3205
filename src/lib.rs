pub mod app;
pub mod config;
pub mod de;
pub mod ingest;
pub mod render;
pub mod snapshot;
pub mod tracking;
