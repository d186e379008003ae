//! Exercise model with hierarchical organization
//!
//! This module implements a tree-based catalog where exercises are grouped into tracks
//! and tracks can be nested. Each exercise carries the goals it is graded against and
//! names the work branch a learner solves it on.
//!
//! The inheritance system allows branch defaults (base revision and branch suffix) to
//! flow down from parent tracks to their children, while still allowing override at
//! any level.

pub mod exercise;
pub mod goal;
pub mod inherit;
pub mod track;
