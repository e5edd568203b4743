//! Typed Identifiers
//!
//! UUID-backed IDs for accounts and device sessions, built on
//! `kernel::id::Id` so the two cannot be mixed up.

use kernel::id::Id;

pub struct UserMarker;

/// Account identifier
pub type UserId = Id<UserMarker>;

pub struct DeviceMarker;

/// Device-session identifier, minted fresh at each login
pub type DeviceId = Id<DeviceMarker>;
