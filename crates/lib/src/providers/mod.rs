//! # Providers
//!
//! External collaborators of the pipeline: the generative text provider (`ai`)
//! and the persistent FAQ store (`db`).

pub mod ai;
pub mod db;
