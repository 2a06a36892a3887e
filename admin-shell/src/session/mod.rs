//! Session validity.
//!
//! A session is valid while a credential is stored and the permission state
//! is populated. [`SessionController`] performs the transition to invalid:
//! at most one reaction runs at a time no matter how many concurrent calls
//! report expiry, and [`ExpiryGate`] is the only primitive enforcing that.

mod controller;
mod gate;

pub use controller::{
    Confirmer, ExpiryHandler, ExpiryPolicy, ExpiryReaction, Navigator, SessionController,
    SessionReset, SkipReason,
};
pub use gate::{ExpiryGate, ExpiryPermit};
