//! CourseCraft Auth — password login, federated (social) login, email
//! verification, password reset/change, and purpose-scoped token
//! lifecycle.

pub mod config;
pub mod error;
pub mod mail;
pub mod password;
pub mod provision;
pub mod providers;
pub mod service;
pub mod social;
pub mod store;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use mail::{HttpMailer, MailerConfig};
pub use providers::{
    FacebookGraphClient, GithubApiClient, GoogleConfig, GoogleIdentityClient, ProviderApiError,
};
pub use provision::AccountProvisioner;
pub use service::{AuthService, RegisterInput};
pub use social::{SocialAuthenticator, SocialLogin};
pub use store::TokenStore;
pub use token::TokenClaims;
