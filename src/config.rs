use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_EMAIL_DOMAINS: &str = "kancmail.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub media_root: PathBuf,
    /// Email domains the user importer derives usernames from.
    pub email_domains: Vec<String>,
}

impl Settings {
    /// Reads the process environment after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = match lookup("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };
        let media_root = lookup("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT));
        Ok(Self {
            database_url,
            port,
            media_root,
            email_domains: email_domains(&lookup)?,
        })
    }
}

/// `IMPORT_EMAIL_DOMAINS` on its own, for runs that never touch the database.
pub fn email_domains(lookup: impl Fn(&str) -> Option<String>) -> Result<Vec<String>, ConfigError> {
    let raw = lookup("IMPORT_EMAIL_DOMAINS").unwrap_or_else(|| DEFAULT_EMAIL_DOMAINS.to_owned());
    let domains = parse_domains(&raw);
    if domains.is_empty() {
        return Err(ConfigError::Invalid {
            name: "IMPORT_EMAIL_DOMAINS",
            value: raw,
        });
    }
    Ok(domains)
}

fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|domain| domain.trim().trim_start_matches('@').to_lowercase())
        .filter(|domain| !domain.is_empty())
        .collect()
}
