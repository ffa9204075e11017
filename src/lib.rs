//! MyAvatar - voice-driven avatar video generation CLI
//!
//! This crate records voice audio from the microphone, submits it to the
//! MyAvatar backend for avatar video generation, and polls the job until
//! the provider finishes.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, backend HTTP, clipboard, etc.)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
