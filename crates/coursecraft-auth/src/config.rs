//! Authentication configuration.

/// Configuration for the authentication services.
///
/// The PEM key pair is the signing material for every issued token
/// (the process-level signing key provider).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for token signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for token verification.
    pub jwt_public_key_pem: String,
    /// Token issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Stateless access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_lifetime_secs: u64,
    /// Lifetime of verify-email and reset-password tokens in seconds
    /// (default: 3600 = 1 hour).
    pub email_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            jwt_issuer: "coursecraft".into(),
            access_token_lifetime_secs: 900,
            email_token_lifetime_secs: 3600,
            pepper: None,
        }
    }
}
