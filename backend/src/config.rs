use anyhow::{anyhow, Context};
use chrono::Duration;
use std::{env, net::SocketAddr, str::FromStr};

use crate::utils::cookies::{CookieOptions, SameSite};

#[derive(Debug, Clone)]
pub struct Config {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub token_issuer: String,
    pub access_token_ttl_minutes: u64,
    pub refresh_token_ttl_days: u64,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    /// Zero disables the background sweep; lookups still evict lazily.
    pub session_sweep_interval_seconds: u64,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so parsing can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token_secret = required_secret(&lookup, "ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = required_secret(&lookup, "REFRESH_TOKEN_SECRET")?;
        if access_token_secret == refresh_token_secret {
            return Err(anyhow!(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must be different"
            ));
        }

        let token_issuer = lookup("TOKEN_ISSUER")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "portal".to_string());

        let access_token_ttl_minutes = parse_or(&lookup, "ACCESS_TOKEN_TTL_MINUTES", 10u64)?;
        let refresh_token_ttl_days = parse_or(&lookup, "REFRESH_TOKEN_TTL_DAYS", 7u64)?;
        if access_token_ttl_minutes == 0 || refresh_token_ttl_days == 0 {
            return Err(anyhow!("Token TTLs must be greater than zero"));
        }

        let cookie_secure = parse_or(&lookup, "COOKIE_SECURE", true)?;
        let cookie_same_site = lookup("COOKIE_SAME_SITE")
            .map(|value| value.parse::<SameSite>())
            .transpose()
            .map_err(|e| anyhow!("Invalid COOKIE_SAME_SITE value: {}", e))?
            .unwrap_or(SameSite::Lax);

        let session_sweep_interval_seconds =
            parse_or(&lookup, "SESSION_SWEEP_INTERVAL_SECONDS", 300u64)?;
        let bind_addr = parse_or(
            &lookup,
            "BIND_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;

        Ok(Config {
            access_token_secret,
            refresh_token_secret,
            token_issuer,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
            cookie_secure,
            cookie_same_site,
            session_sweep_interval_seconds,
            bind_addr,
        })
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_ttl_minutes as i64)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_ttl_days as i64)
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
        }
    }
}

fn required_secret<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("{} must be set", key))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = load(&[
            ("ACCESS_TOKEN_SECRET", "access-secret"),
            ("REFRESH_TOKEN_SECRET", "refresh-secret"),
        ])
        .expect("config");

        assert_eq!(config.token_issuer, "portal");
        assert_eq!(config.access_token_ttl(), Duration::minutes(10));
        assert_eq!(config.refresh_token_ttl(), Duration::days(7));
        assert!(config.cookie_secure);
        assert_eq!(config.cookie_same_site, SameSite::Lax);
        assert_eq!(config.session_sweep_interval_seconds, 300);
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("ACCESS_TOKEN_SECRET", "access-secret"),
            ("REFRESH_TOKEN_SECRET", "refresh-secret"),
            ("TOKEN_ISSUER", "makerspace"),
            ("ACCESS_TOKEN_TTL_MINUTES", "5"),
            ("REFRESH_TOKEN_TTL_DAYS", "30"),
            ("COOKIE_SECURE", "false"),
            ("COOKIE_SAME_SITE", "strict"),
            ("SESSION_SWEEP_INTERVAL_SECONDS", "0"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ])
        .expect("config");

        assert_eq!(config.token_issuer, "makerspace");
        assert_eq!(config.access_token_ttl(), Duration::minutes(5));
        assert_eq!(config.refresh_token_ttl(), Duration::days(30));
        assert!(!config.cookie_secure);
        assert_eq!(config.cookie_same_site, SameSite::Strict);
        assert_eq!(config.session_sweep_interval_seconds, 0);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn missing_or_shared_secrets_are_rejected() {
        let err = load(&[("REFRESH_TOKEN_SECRET", "refresh-secret")]).unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_SECRET"));

        let err = load(&[("ACCESS_TOKEN_SECRET", "access-secret")]).unwrap_err();
        assert!(err.to_string().contains("REFRESH_TOKEN_SECRET"));

        assert!(load(&[
            ("ACCESS_TOKEN_SECRET", "same"),
            ("REFRESH_TOKEN_SECRET", "same"),
        ])
        .is_err());
    }

    #[test]
    fn unparseable_values_are_rejected() {
        let err = load(&[
            ("ACCESS_TOKEN_SECRET", "access-secret"),
            ("REFRESH_TOKEN_SECRET", "refresh-secret"),
            ("ACCESS_TOKEN_TTL_MINUTES", "ten"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL_MINUTES"));

        assert!(load(&[
            ("ACCESS_TOKEN_SECRET", "access-secret"),
            ("REFRESH_TOKEN_SECRET", "refresh-secret"),
            ("REFRESH_TOKEN_TTL_DAYS", "0"),
        ])
        .is_err());
    }
}
