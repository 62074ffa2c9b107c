//! Persona catalog and startup validation for the speaking meeting bot
//!
//! - [`persona`]: parse persona documents, load/resolve/save the catalog
//! - [`validation`]: API key, persona directory and connectivity checks
//! - [`config`]: `pcat.yaml` configuration

pub mod config;
pub mod persona;
pub mod validation;
