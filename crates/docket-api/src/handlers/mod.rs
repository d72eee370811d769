pub mod accounts;
pub mod corporation;
pub mod files;
pub mod health;
pub mod partners;
pub mod tasks;
pub mod upload;
pub mod users;
