//! Core types for the domain pack engine
//!
//! This crate provides the foundational types shared by every other crate:
//! - Verdict and issue types produced by validation and interpretation
//! - Error kinds and violation codes
//! - Dotted field paths
//! - Section names
//! - Clock abstraction for deterministic timestamps

pub mod clock;
pub mod error;
pub mod path;
pub mod section;
pub mod verdict;
pub mod version;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use path::{FieldPath, PathSegment};
pub use section::SectionName;
pub use verdict::{ErrorKind, ValidationIssue, ValidationVerdict, ValidationWarning, ViolationCode};
pub use version::is_semver;
