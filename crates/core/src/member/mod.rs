//! Member accounts and the savings journal.
//!
//! A member account is created at registration and never hard-deleted. Its
//! savings balance moves only through contributions and their reversals.

pub mod types;

pub use types::{Contribution, MemberAccount, NewMember};
