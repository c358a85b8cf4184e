//! Client library for a remote model execution service: list deployed
//! models, submit inference jobs with multi-part inputs, poll them to a
//! terminal status and fetch structured results. The `cli` module is the
//! command-line front end over the same client.

pub mod adapters;
pub mod cli;
pub mod core;
pub mod utils;
