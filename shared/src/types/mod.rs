pub mod client_config;
pub mod json_error;
pub mod login;
pub mod twofa;
pub mod user;

pub use self::client_config::{ApiConfig, AppConfig, ConfigError, StorageConfig};
pub use self::json_error::ErrorBody;
pub use self::login::{LoginError, LoginRequest};
pub use self::twofa::{StatusResponse, TwoFaError, TwoFaSetup, TwoFaStatus, VerifyCodeData};
pub use self::user::{AppUser, GUEST_EMAIL, derive_user};
