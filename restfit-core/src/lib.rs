//! Core declaration and descriptor types for restfit.
//!
//! This crate provides the I/O-free building blocks shared by the client
//! (`restfit-client`): the declarative endpoint model, the parsed descriptor
//! model, body conversion, and multipart payloads.
//!
//! ## Modules
//!
//! - [`definition`]: Service and endpoint declarations (verb, path, parameter annotations)
//! - [`descriptor`]: Parsed, immutable endpoint descriptors
//! - [`headers`]: Ordered, case-insensitive header lists
//! - [`converter`]: Body conversion contract and the JSON converter
//! - [`multipart`]: The single binary part of a multipart request
//! - [`error`]: Definition and conversion errors

mod converter;
mod definition;
mod descriptor;
mod error;
mod headers;
mod multipart;

pub use converter::*;
pub use definition::*;
pub use descriptor::*;
pub use error::*;
pub use headers::*;
pub use multipart::*;
