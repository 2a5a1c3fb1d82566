//! core
//!
//! Domain leaves shared by the validator and the builder.
//!
//! - [`digest`] - Streaming digest engine over the algorithm registry
//! - [`paths`] - Logical/content path rules and collision detection
//! - [`versions`] - Version number type and sequence validation
//! - [`inventory`] - Typed inventory document (strict parse)
//! - [`object_paths`] - Centralized path routing inside an object

pub mod digest;
pub mod inventory;
pub mod object_paths;
pub mod paths;
pub mod versions;
