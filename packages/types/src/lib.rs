//! Shared primitives for the selltrack workspace.
//!
//! Every crate in the workspace funnels errors and ids through here so the
//! API crate and the binaries agree on one `Result` type and one id scheme.

pub use anyhow::{Context, Error, Result, anyhow, bail};
pub use serde_json::Value;

pub mod json {
    pub use serde_json::{Map, Value, from_slice, from_str, from_value, json, to_string, to_value};
}

/// Collision-resistant, URL-safe identifier for every primary key.
pub fn create_id() -> String {
    cuid2::create_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_url_safe() {
        let a = create_id();
        let b = create_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
