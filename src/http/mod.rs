//! HTTP protocol layer module
//!
//! Response builders shared by the replay handler and the connection layer.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_413_response, build_error_response, build_redirect_response_with_code,
    build_replay_response,
};
