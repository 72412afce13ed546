//! Command modules for the martcfg CLI.
//!
//! - `dataset_cmd`: listing, showing and specializing dataset configs from a
//!   document file or directory
//! - `registry_cmd`: inspecting mart registry documents

pub mod dataset_cmd;
pub mod registry_cmd;
