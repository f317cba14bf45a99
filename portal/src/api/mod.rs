//! HTTP and WebSocket API surface.

pub mod auth;
pub mod error;
pub mod events;
pub mod extract;
pub mod profile;
pub mod registrations;
pub mod ws;

pub use error::AppError;
