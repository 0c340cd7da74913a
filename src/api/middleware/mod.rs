//! API middleware

mod auth;

pub use auth::RequireApiKey;
