pub mod credentials;
pub mod factory;
pub mod identity;
pub mod password;
pub mod secret;
pub mod token_codec;

pub use credentials::{AuthFailure, CredentialVerifier, LoginSuccess};
pub use factory::{AuthServices, build_auth_services};
pub use identity::{IdentityError, IdentityResolver};
pub use password::{BcryptHasher, PasswordHasher};
pub use secret::SigningSecret;
pub use token_codec::{Claims, TokenCodec, TokenError};
