//! # Communications interface crate.
//!
//! Provides the message definitions exchanged between the navigation executable and the rest of
//! the autonomy stack.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Navigation messages (poses, grids, routes, paths and the vehicle state signal)
pub mod nav;

/// Inbound message envelope, as delivered to the navigation executable
pub mod inbound;
