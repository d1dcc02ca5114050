//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `TraversalPhase`: Where the traversal of one category pair currently is
//! - `StopReason`: Why a traversal ended

mod phase;

pub use phase::{StopReason, TraversalPhase};
