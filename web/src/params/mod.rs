//! This module holds typed parameters for various endpoint inputs.
//!
//! Each parameter type is deserialized straight from the query string or JSON
//! body. Blank-field checks happen in the controllers via
//! `error::require_non_empty` so the error names the offending field.

pub(crate) mod dm;
pub(crate) mod scene;
