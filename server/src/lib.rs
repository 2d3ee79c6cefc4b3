//! Book pages server: accepts book uploads, stores them in SQLite and
//! publishes a static HTML page for each book.
pub mod config;
pub mod database;
pub mod ids;
pub mod models;
pub mod render;
pub mod server;
pub mod staging;
pub mod state;
pub mod upload;

pub use config::ServerConfig;
pub use database::{BookStore, StoreError};
pub use ids::{IdSource, SequentialIds, UuidIds};
pub use models::{Book, ImageUpload};
pub use server::{router, start_server};
pub use state::{AppState, ContentDirs};
