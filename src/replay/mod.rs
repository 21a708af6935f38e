//! Request replay module
//!
//! Turns a request into a descriptor lookup, a recording, and a replayed
//! response.

pub mod descriptor;
pub mod dump;
pub mod error;
pub mod handler;
pub mod key;

// Re-export main entry points
pub use error::ReplayError;
pub use handler::RedirectHandler;
pub use key::PreviewRule;
