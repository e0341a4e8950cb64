//! Build plumbing shared by the stages.
//!
//! - [`context`] - absolute paths for one architecture's run
//! - [`lock`] - exclusive claim on the working directory
//! - [`mount`] - loop mount guard for boot images

pub mod context;
pub mod lock;
pub mod mount;
