//! Authentication configuration.

/// Configuration for identity token validation.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 public key of the identity provider.
    pub jwt_public_key_pem: String,
    /// PEM-encoded Ed25519 private key. Only needed where tokens are
    /// issued (provider tooling, tests); empty otherwise.
    pub jwt_private_key_pem: String,
    /// Expected `iss` claim.
    pub jwt_issuer: String,
    /// Lifetime of issued identity tokens in seconds (default: 3600).
    pub identity_token_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_public_key_pem: String::new(),
            jwt_private_key_pem: String::new(),
            jwt_issuer: "threadline".into(),
            identity_token_lifetime_secs: 3600,
        }
    }
}
