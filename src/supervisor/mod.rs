//! Service group supervisor
//!
//! Launches the FastCGI wrapper, the mirror sync daemon and the web server,
//! forwards termination signals to them and treats the exit of any one as
//! fatal for the whole group.

pub mod group;
pub mod process;
pub mod service;
pub mod signals;
pub mod slots;

pub use group::*;
pub use process::*;
pub use service::*;
pub use signals::*;
pub use slots::*;
