use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Consultorio";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Page size when a listing request does not name one.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;
/// Hard upper bound for any listing page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Appointment length in minutes when the request does not name one.
pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 30;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
const DEFAULT_PASSWORD_ITERATIONS: u32 = 210_000;
/// Longest accepted session lifetime, in hours (366 days).
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    "info,consultorio_lib=debug,tower_http=info".to_string()
}

/// Get the application data directory.
/// ~/Consultorio/ unless overridden with `CONSULTORIO_DATA_DIR`.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CONSULTORIO_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Default database file inside the data directory.
pub fn database_path() -> PathBuf {
    app_data_dir().join("consultorio.db")
}

/// Initial staff account created when the office has no users yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub session_ttl_hours: i64,
    pub password_iterations: u32,
    /// Allowed browser origin for the SPA. `None` allows any origin.
    pub cors_origin: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl Settings {
    /// Read `CONSULTORIO_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("CONSULTORIO_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "CONSULTORIO_BIND",
                value: bind_raw.clone(),
            })?;

        let database_path = lookup("CONSULTORIO_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(database_path);

        let session_ttl_hours = parse_or(
            &lookup,
            "CONSULTORIO_SESSION_TTL_HOURS",
            DEFAULT_SESSION_TTL_HOURS,
        )?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            return Err(ConfigError::InvalidValue {
                key: "CONSULTORIO_SESSION_TTL_HOURS",
                value: session_ttl_hours.to_string(),
            });
        }

        let password_iterations = parse_or(
            &lookup,
            "CONSULTORIO_PASSWORD_ITERATIONS",
            DEFAULT_PASSWORD_ITERATIONS,
        )?;
        if password_iterations < 1 {
            return Err(ConfigError::InvalidValue {
                key: "CONSULTORIO_PASSWORD_ITERATIONS",
                value: password_iterations.to_string(),
            });
        }

        let bootstrap_admin = match (
            lookup("CONSULTORIO_ADMIN_USER"),
            lookup("CONSULTORIO_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { username, password })
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            database_path,
            session_ttl_hours,
            password_iterations,
            cors_origin: lookup("CONSULTORIO_CORS_ORIGIN").filter(|o| !o.is_empty()),
            bootstrap_admin,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
