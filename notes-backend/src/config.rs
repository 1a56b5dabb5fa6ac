use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Hours a login session stays valid without activity.
    pub const SESSION_TTL_HOURS: &str = "SESSION_TTL_HOURS";
    /// "deferred" (reply 204, then write) or "confirmed" (write, then reply).
    pub const NOTES_MUTATION_MODE: &str = "NOTES_MUTATION_MODE";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const BIND_ADDRESS: &str = "0.0.0.0";
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const SESSION_TTL_HOURS: i64 = 24;
}

/// When an owner's update or delete is applied relative to the 204 reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationMode {
    /// Reply 204 first, then apply the write on a spawned task. A failed
    /// write is only logged.
    #[default]
    Deferred,
    /// Apply the write, then reply. A failed write is reported as 400.
    Confirmed,
}

impl MutationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationMode::Deferred => "deferred",
            MutationMode::Confirmed => "confirmed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deferred" => Some(MutationMode::Deferred),
            "confirmed" => Some(MutationMode::Confirmed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub mutation_mode: MutationMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            bind_address: defaults::BIND_ADDRESS.to_string(),
            database_url: defaults::DATABASE_URL.to_string(),
            session_ttl_hours: defaults::SESSION_TTL_HOURS,
            mutation_mode: MutationMode::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unparseable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(env_vars::PORT) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Invalid {} '{}', using {}", env_vars::PORT, raw, defaults::PORT);
                defaults::PORT
            }),
            None => defaults::PORT,
        };

        let session_ttl_hours = match lookup(env_vars::SESSION_TTL_HOURS) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    log::warn!(
                        "Invalid {} '{}', using {}",
                        env_vars::SESSION_TTL_HOURS,
                        raw,
                        defaults::SESSION_TTL_HOURS
                    );
                    defaults::SESSION_TTL_HOURS
                }
            },
            None => defaults::SESSION_TTL_HOURS,
        };

        let mutation_mode = match lookup(env_vars::NOTES_MUTATION_MODE) {
            Some(raw) => MutationMode::from_str(&raw).unwrap_or_else(|| {
                log::warn!(
                    "Unknown {} '{}', using {}",
                    env_vars::NOTES_MUTATION_MODE,
                    raw,
                    MutationMode::default().as_str()
                );
                MutationMode::default()
            }),
            None => MutationMode::default(),
        };

        Self {
            port,
            bind_address: lookup(env_vars::BIND_ADDRESS)
                .unwrap_or_else(|| defaults::BIND_ADDRESS.to_string()),
            database_url: lookup(env_vars::DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            session_ttl_hours,
            mutation_mode,
        }
    }
}
