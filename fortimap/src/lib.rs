//! FortiManager resources on top of `cfgtree-core`.
//!
//! # Layout
//!
//! - [`resources`]: built-in field tables, one file per resource type
//! - [`catalog`]: lookup over built-ins plus TOML schema files
//! - [`patches`]: patch rules for fields the device returns with the wrong type
//! - [`client`]: the device API seam and in-process stand-ins
//! - [`resource`]: create/read/update/delete cycles with parameter resolution
//! - [`settings`]: `fortimap.toml`
//! - [`report`] and [`logging`]: terminal output

pub mod catalog;
pub mod client;
pub mod logging;
pub mod patches;
pub mod report;
pub mod resource;
pub mod resources;
pub mod settings;
