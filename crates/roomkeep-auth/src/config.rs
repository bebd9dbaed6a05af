/// Keys, lifetimes and password rules shared by login and token checks.
///
/// The server fills this from `ROOMKEEP_*` variables; tests build it with
/// struct-update syntax over `Default`.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Ed25519 PKCS#8 PEM used to sign access tokens.
    pub jwt_private_key_pem: String,
    pub jwt_public_key_pem: String,
    /// 15 minutes unless overridden.
    pub access_token_lifetime_secs: u64,
    /// 7 days unless overridden.
    pub refresh_token_lifetime_secs: u64,
    pub jwt_issuer: String,
    /// Must equal the pepper the user repository hashes with.
    pub pepper: Option<String>,
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 900,
            refresh_token_lifetime_secs: 604_800,
            jwt_issuer: "roomkeep".into(),
            pepper: None,
            min_password_length: 8,
        }
    }
}
