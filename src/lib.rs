//! Story Engine: episodic story progression for narrative games.
//!
//! Gates episodes behind prerequisites, walks accepted episodes through
//! their ordered beats, and dispatches each beat's actions to handlers
//! supplied by the host game.

pub mod core;
pub mod schema;
