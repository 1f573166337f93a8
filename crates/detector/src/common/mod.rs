//! Common utilities and types used throughout the detector.
//!
//! This module provides the building blocks shared by every pipeline stage. It includes:
//! 1. **Address Types:** A strong type for physical addresses taken from trace records.
//! 2. **Access Kinds:** Classification of trace records (read, write, instruction fetch).
//! 3. **Error Handling:** The crate error enum and result alias.

/// Physical address type.
pub mod addr;

/// Access kind definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::PhysAddr;
pub use data::AccessKind;
pub use error::{Error, Result};
