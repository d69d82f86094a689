//! Core scanning and validation logic for recovering unfragmented image
//! files (JPEG, PNG, GIF, TIFF, WebP) from a raw byte view.
//!
//! The entry point is [`Carver`], which walks a borrowed byte slice and
//! yields a [`RecoveredObject`] for every position at which one of the
//! per-format validators confirms a complete, structurally valid file.
//! Validators are pure functions of their input window and reject with
//! `None`; malformed candidates are the common case, not an error.

pub mod bytes;
mod carver;
mod error;
pub mod gif;
pub mod jpeg;
pub mod png;
pub mod tiff;
mod types;
pub mod webp;

pub use carver::{Carver, CarverConfig, DEFAULT_MAX_WINDOW};
pub use error::{CoreError, Result};
pub use types::{ImageFormat, RecoveredObject};
