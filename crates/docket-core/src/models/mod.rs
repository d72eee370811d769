//! Data models, one sub-module per domain area.

mod account;
mod api_key;
mod corporation;
mod file;
mod partner;
mod task;
mod tenant;
mod user;

pub use account::*;
pub use api_key::*;
pub use corporation::*;
pub use file::*;
pub use partner::*;
pub use task::*;
pub use tenant::*;
pub use user::*;
