#![doc = "The `taskvault` library crate."]
#![doc = ""]
#![doc = "A multi-tenant task management API. Users sign up, log in for a bearer token,"]
#![doc = "and manage projects and the tasks inside them. Every project has one owner and"]
#![doc = "every task belongs to its project's owner; no user can see or touch another"]
#![doc = "user's data. The binary (`main.rs`) wires these modules into an HTTP server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ownership;
pub mod routes;
pub mod store;

pub use crate::error::AppError;
