//! Core functionality for autocoder.
//!
//! This module contains the main components:
//! - [`launcher`]: Credential gate, project placement, and dispatch
//! - [`credentials`]: Credential detection and remediation message
//! - [`paths`]: Project directory normalization
//! - [`executor`]: Agent process execution
//! - [`error`]: Error types and result handling

pub mod credentials;
pub mod error;
pub mod executor;
pub mod launcher;
pub mod paths;
