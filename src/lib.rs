// Library surface for headless/integration tests and reuse.
// Rendering and key bindings live in the binary.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod detector;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod util;
