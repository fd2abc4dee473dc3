//! Input models for the built-in tools.
//!
//! All inputs accept `camelCase` aliases next to their `snake_case` names.

mod inputs;

pub use inputs::*;
