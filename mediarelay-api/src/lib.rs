// Library entry point for tests and external usage
// Re-exports all modules needed for testing

pub mod api_docs;
pub mod app;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod settings;
pub mod version;

// Re-export commonly used types
pub use app::AppState;
pub use error::ApiError;
pub use settings::Settings;
