// Handlers module - Centralizes all request handlers
pub mod media;
pub mod tasks;
