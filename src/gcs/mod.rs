//! Google Cloud collaborators: project directory and object listings over
//! the public REST APIs.

pub mod client;
pub mod types;

pub use client::GcsClient;
