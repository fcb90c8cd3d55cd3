//! CLI command implementations.

pub(crate) mod login;
pub(crate) mod serve;

pub(crate) use login::LoginArgs;
pub(crate) use serve::ServeArgs;
