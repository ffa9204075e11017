//! Notification adapters

mod notify_rust;

pub use notify_rust::NotifyRustNotifier;
