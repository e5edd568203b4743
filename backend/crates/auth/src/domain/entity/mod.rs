//! Domain Entities

pub mod account;
pub mod device_session;

pub use account::{Account, EmailConfirmation, PasswordRecovery};
pub use device_session::DeviceSession;
