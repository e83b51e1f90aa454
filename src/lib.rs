#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Authentication and authorization core of the task-tracking API: credential"]
#![doc = "verification, bearer tokens, the request gate, the route policy and the"]
#![doc = "uniform 401 responder, plus the handlers and storage they protect."]
#![doc = "The binary (`main.rs`) reads the configuration and assembles the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
