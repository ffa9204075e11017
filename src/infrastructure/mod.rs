//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the microphone, the backend HTTP API, and the desktop.

pub mod backend;
pub mod clipboard;
pub mod config;
pub mod notification;
pub mod recording;

// Re-export adapters
pub use backend::{BackendConfig, HttpBackendClient};
pub use clipboard::ArboardClipboard;
pub use config::XdgConfigStore;
pub use notification::NotifyRustNotifier;
pub use recording::CpalVoiceRecorder;
