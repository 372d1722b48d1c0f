//! Domain model for the Q&A interaction core.
//!
//! # Responsibility
//! - Define canonical data structures shared by repositories and services.
//! - Keep vote-transition and policy rules as plain, storage-free logic.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - A voter holds at most one direction per entity; neutral means absent.
//! - Badge sets are monotonic; a reputation drop never removes a badge.

pub mod comment;
pub mod notification;
pub mod policy;
pub mod post;
pub mod user;
pub mod vote;
