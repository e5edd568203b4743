//! Value Objects

pub mod email;
pub mod ids;
pub mod login;

pub use email::Email;
pub use ids::{DeviceId, UserId};
pub use login::Login;
