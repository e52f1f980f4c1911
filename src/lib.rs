// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod runtime;
pub mod scramble;
pub mod session;
pub mod stats;
pub mod time_format;
pub mod time_series;
pub mod timer;
pub mod util;
