//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod confirm_email;
pub mod devices;
pub mod login;
pub mod logout;
pub mod me;
pub mod recovery;
pub mod refresh;
pub mod refresh_guard;
pub mod register;

// Re-exports
pub use config::AuthConfig;
pub use confirm_email::ConfirmEmailUseCase;
pub use devices::DeviceSessionsUseCase;
pub use login::{LoginInput, LoginUseCase, TokenPair};
pub use logout::LogoutUseCase;
pub use me::CurrentUserUseCase;
pub use recovery::PasswordRecoveryUseCase;
pub use refresh::RefreshSessionUseCase;
pub use refresh_guard::RefreshTokenGuard;
pub use register::{RegisterInput, RegisterUseCase};
