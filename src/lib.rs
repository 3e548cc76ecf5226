pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod models;
pub mod openai;
pub mod pinecone;
pub mod provider;
pub mod server;
pub mod store;

pub use config::AppConfig;
pub use engine::RagEngine;
pub use error::RagError;
pub use server::run_server;
pub use store::ConfigStore;
