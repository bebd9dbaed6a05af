//! Environment-driven server configuration.
//!
//! Every setting is read from a `ROOMKEEP_*` variable. Only the JWT key
//! pair is required; everything else has a default suitable for a
//! single-node deployment backed by the in-memory engine.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use roomkeep_auth::AuthConfig;
use roomkeep_booking::BookingConfig;
use roomkeep_db::DbConfig;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Credentials for the administrator account created at startup when
/// no account with that username exists yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub booking: BookingConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let db_defaults = DbConfig::default();
        let auth_defaults = AuthConfig::default();

        let db = DbConfig {
            url: env.string("ROOMKEEP_DB_URL").unwrap_or(db_defaults.url),
            namespace: env
                .string("ROOMKEEP_DB_NAMESPACE")
                .unwrap_or(db_defaults.namespace),
            database: env
                .string("ROOMKEEP_DB_DATABASE")
                .unwrap_or(db_defaults.database),
            username: env.string("ROOMKEEP_DB_USERNAME"),
            password: env.string("ROOMKEEP_DB_PASSWORD"),
        };

        let auth = AuthConfig {
            jwt_private_key_pem: env
                .pem("ROOMKEEP_JWT_PRIVATE_KEY", "ROOMKEEP_JWT_PRIVATE_KEY_PATH")?,
            jwt_public_key_pem: env
                .pem("ROOMKEEP_JWT_PUBLIC_KEY", "ROOMKEEP_JWT_PUBLIC_KEY_PATH")?,
            access_token_lifetime_secs: env
                .parsed("ROOMKEEP_ACCESS_TOKEN_TTL_SECS")?
                .unwrap_or(auth_defaults.access_token_lifetime_secs),
            refresh_token_lifetime_secs: env
                .parsed("ROOMKEEP_REFRESH_TOKEN_TTL_SECS")?
                .unwrap_or(auth_defaults.refresh_token_lifetime_secs),
            jwt_issuer: env
                .string("ROOMKEEP_JWT_ISSUER")
                .unwrap_or(auth_defaults.jwt_issuer),
            pepper: env.string("ROOMKEEP_PASSWORD_PEPPER"),
            min_password_length: env
                .parsed("ROOMKEEP_MIN_PASSWORD_LENGTH")?
                .unwrap_or(auth_defaults.min_password_length),
        };

        let booking = BookingConfig {
            card_encryption_key: env
                .string("ROOMKEEP_CARD_KEY")
                .map(|hex| parse_key(&hex))
                .transpose()?,
            ..BookingConfig::default()
        };

        let bootstrap_admin = match (
            env.string("ROOMKEEP_ADMIN_USERNAME"),
            env.string("ROOMKEEP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                email: env
                    .string("ROOMKEEP_ADMIN_EMAIL")
                    .unwrap_or_else(|| format!("{username}@localhost")),
                username,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ROOMKEEP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ROOMKEEP_ADMIN_USERNAME")),
        };

        let bind_addr = env
            .parsed("ROOMKEEP_BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        info!(
            %bind_addr,
            db_url = %db.url,
            card_sealing = booking.card_encryption_key.is_some(),
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            db,
            auth,
            booking,
            bootstrap_admin,
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Non-empty value of `key`.
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.string(key)
            .map(|raw| {
                raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                    key,
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// A PEM given inline, or read from a file path.
    fn pem(&self, inline: &'static str, path: &'static str) -> Result<String, ConfigError> {
        if let Some(pem) = self.string(inline) {
            return Ok(pem);
        }
        let file = self.string(path).ok_or(ConfigError::Missing(path))?;
        std::fs::read_to_string(&file).map_err(|source| ConfigError::Io { path: file, source })
    }
}

/// 64 hex characters into an AES-256 key.
fn parse_key(hex_key: &str) -> Result<[u8; 32], ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: "ROOMKEEP_CARD_KEY",
        message,
    };
    let bytes = hex::decode(hex_key).map_err(|e| invalid(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| invalid(format!("expected 32 bytes, got {}", b.len())))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    const KEYS: [(&str, &str); 2] = [
        ("ROOMKEEP_JWT_PRIVATE_KEY", "private-pem"),
        ("ROOMKEEP_JWT_PUBLIC_KEY", "public-pem"),
    ];

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let config = load(&KEYS).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.db.url, "mem://");
        assert_eq!(config.auth.jwt_issuer, "roomkeep");
        assert_eq!(config.auth.access_token_lifetime_secs, 900);
        assert!(config.booking.card_encryption_key.is_none());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn jwt_keys_are_required() {
        let err = load(&[("ROOMKEEP_JWT_PUBLIC_KEY", "public-pem")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ROOMKEEP_JWT_PRIVATE_KEY_PATH")));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = KEYS.to_vec();
        vars.extend([
            ("ROOMKEEP_BIND_ADDR", "127.0.0.1:9000"),
            ("ROOMKEEP_DB_URL", "ws://db:8000"),
            ("ROOMKEEP_DB_USERNAME", "root"),
            ("ROOMKEEP_DB_PASSWORD", "secret"),
            ("ROOMKEEP_ACCESS_TOKEN_TTL_SECS", "60"),
            ("ROOMKEEP_MIN_PASSWORD_LENGTH", "12"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<std::net::SocketAddr>().unwrap());
        assert_eq!(config.db.url, "ws://db:8000");
        assert_eq!(config.db.username.as_deref(), Some("root"));
        assert_eq!(config.auth.access_token_lifetime_secs, 60);
        assert_eq!(config.auth.min_password_length, 12);
    }

    #[test]
    fn malformed_number_names_the_key() {
        let mut vars = KEYS.to_vec();
        vars.push(("ROOMKEEP_ACCESS_TOKEN_TTL_SECS", "soon"));
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("ROOMKEEP_ACCESS_TOKEN_TTL_SECS"));
    }

    #[test]
    fn card_key_must_be_32_hex_bytes() {
        let mut vars = KEYS.to_vec();
        vars.push(("ROOMKEEP_CARD_KEY", "abcd"));
        assert!(load(&vars).is_err());

        let hex_key = "11".repeat(32);
        let mut vars = KEYS.to_vec();
        vars.push(("ROOMKEEP_CARD_KEY", hex_key.as_str()));
        assert_eq!(load(&vars).unwrap().booking.card_encryption_key, Some([0x11; 32]));
    }

    #[test]
    fn bootstrap_admin_needs_both_username_and_password() {
        let mut vars = KEYS.to_vec();
        vars.push(("ROOMKEEP_ADMIN_USERNAME", "root"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("ROOMKEEP_ADMIN_PASSWORD")
        ));

        vars.push(("ROOMKEEP_ADMIN_PASSWORD", "change-me-now"));
        let admin = load(&vars).unwrap().bootstrap_admin.unwrap();
        assert_eq!(admin.email, "root@localhost");
    }
}
