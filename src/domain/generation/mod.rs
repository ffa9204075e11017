//! Generation domain - jobs, statuses, catalog entries

pub mod catalog;
pub mod job;
pub mod status;

pub use catalog::{Avatar, VideoRecord};
pub use job::{GenerationJob, JobId};
pub use status::{JobStatus, StatusMapping, StatusSnapshot};
