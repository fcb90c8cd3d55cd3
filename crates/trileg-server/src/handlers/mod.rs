//! HTTP request handlers.

pub(crate) mod callback;
