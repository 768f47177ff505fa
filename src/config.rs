// src/config.rs
use envconfig::Envconfig;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL", default = "sqlite://campus.db")]
    pub database_url: String,

    #[envconfig(from = "PORT", default = "3000")]
    pub port: u16,

    /// Signs the session cookie. Must be at least 64 bytes.
    #[envconfig(from = "SESSION_SECRET")]
    pub session_secret: Option<String>,

    #[envconfig(from = "BCRYPT_COST", default = "12")]
    pub bcrypt_cost: u32,

    #[envconfig(from = "SESSION_INACTIVITY_HOURS", default = "24")]
    pub session_inactivity_hours: i64,
}

impl Config {
    pub fn load() -> Result<Self, envconfig::Error> {
        dotenvy::dotenv().ok();
        Config::init_from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(config.database_url, "sqlite://campus.db");
        assert_eq!(config.port, 3000);
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.session_inactivity_hours, 24);
        assert!(config.session_secret.is_none());
    }

    #[test]
    fn rejects_non_numeric_port() {
        let mut vars = HashMap::new();
        vars.insert("PORT".to_string(), "eighty".to_string());
        assert!(Config::init_from_hashmap(&vars).is_err());
    }
}
