//! Integration Tests Module
//!
//! End-to-end tests for Prompt Studio: store editing sessions, persistence
//! through the SQLite database, import/export round trips over real files,
//! streamed section parsing, and the invoke dispatcher with a scripted AI
//! provider.

// Prompt store editing flows
mod store_test;

// Persistence through the SQLite key/value store
mod persistence_test;

// Import and export through files on disk
mod import_export_test;

// Streamed section parsing into a generation session
mod block_stream_test;

// Invoke dispatcher, including the AI commands
mod commands_test;
