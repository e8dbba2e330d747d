//! cgit-slim - init supervisor and mirror sync daemon for a slim cgit image
//!
//! The supervisor runs the FastCGI wrapper, the mirror sync daemon and the
//! web server as one fate-shared group. The sync daemon keeps bare mirrors
//! of a list of remote repositories up to date.

pub mod error;
pub mod logging;
pub mod supervisor;
pub mod sync;

pub use error::{Result, SlimError};
