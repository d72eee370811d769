//! Helpers shared by request handlers.

pub mod upload;
