//! Boot image preparation for a cluster installer.
//!
//! Given a target architecture, this crate assembles the installer's boot
//! artifacts from packages:
//!
//! - **Package resolution** - local build tree first, generated distribution
//!   second, with the legacy x86-32 family and `noarch` as compatible fallbacks
//! - **Package application** - unpacking RPMs into scratch directories with `rpm`
//! - **Pipeline** - a forward-only sequence of stages that ends with the
//!   ramdisks and kernel packages in the working directory
//!
//! # Architecture
//!
//! ```text
//! initrd-prep (binary)
//!     │
//!     ├── config      initrd-prep.toml
//!     ├── preflight   host tools
//!     ├── build       context, work dir lock, loop mounts
//!     │
//!     └── pipeline ── stages ─┬── packages (index, distro, resolve, apply)
//!                             └── process  (Cmd, Runner)
//! ```

pub mod arch;
pub mod build;
pub mod config;
pub mod error;
pub mod manifest;
pub mod packages;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod stages;

pub use build::context::BuildContext;
pub use config::Config;
pub use error::BuildError;
pub use pipeline::{Pipeline, PipelineState};
