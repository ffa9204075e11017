//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod generate;
pub mod poller;
pub mod ports;

// Re-export use cases
pub use generate::{
    GenerateCallbacks, GenerateError, GenerateInput, GenerateOutput, GenerateVideoUseCase,
    RecordInput,
};
pub use poller::{
    CancelHandle, CompletedVideo, GenerationProgressCallback, PollError, PollSettings,
    StatusPoller, TransportErrorPolicy,
};
