use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;

fn harden_secret_file_permissions(path: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub graphql: GraphQLConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Node id baked into generated ids, 0..=1023. Give every node a
    /// distinct value when running more than one.
    #[serde(default)]
    pub worker_id: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".into(),
            worker_id: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_engine")]
    pub engine: DatabaseEngine,
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Statement timeout in seconds for PostgreSQL connections (0 = disabled).
    #[serde(default)]
    pub statement_timeout_secs: u64,
    /// Idle-in-transaction timeout in seconds for PostgreSQL (0 = disabled).
    #[serde(default)]
    pub idle_in_transaction_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Sqlite,
    Postgres,
}

impl Default for DatabaseEngine {
    fn default() -> Self {
        Self::Sqlite
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: default_database_engine(),
            url: "sqlite://./data/conduit.db?mode=rwc".into(),
            max_connections: default_max_connections(),
            statement_timeout_secs: 0,
            idle_in_transaction_timeout_secs: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_seconds: u64,
    #[serde(default = "default_true")]
    pub registration_enabled: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: generate_random_hex(64),
            jwt_expiry_seconds: default_jwt_expiry(),
            registration_enabled: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GraphQLConfig {
    /// Serve the GraphiQL editor on GET /graphql.
    #[serde(default = "default_true")]
    pub playground: bool,
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self { playground: true }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Generate a cryptographically random hex string of the given length.
fn generate_random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..16u8);
            char::from(if idx < 10 {
                b'0' + idx
            } else {
                b'a' + idx - 10
            })
        })
        .collect()
}

fn default_database_engine() -> DatabaseEngine {
    DatabaseEngine::Sqlite
}
fn default_max_connections() -> u32 {
    20
}
fn default_jwt_expiry() -> u64 {
    86_400
}
fn default_true() -> bool {
    true
}

fn looks_like_placeholder_secret(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return true;
    }
    normalized.contains("change_me")
        || normalized.contains("replace_me")
        || normalized.contains("replace_with")
        || normalized.starts_with("example")
        || normalized == "devkey"
        || normalized == "devsecret"
        || normalized == "secret"
}

fn validate_config(config: &Config) -> Result<()> {
    let jwt_secret = config.auth.jwt_secret.trim();
    if jwt_secret.len() < 32 || looks_like_placeholder_secret(jwt_secret) {
        anyhow::bail!(
            "Invalid auth.jwt_secret: use a strong random secret (at least 32 characters) and never leave placeholder values"
        );
    }
    if config.server.worker_id > 1023 {
        anyhow::bail!(
            "Invalid server.worker_id: the id field holds 10 bits, use a value between 0 and 1023"
        );
    }
    Ok(())
}

/// Generate a commented config file template with the given values filled in.
fn generate_config_template(config: &Config) -> String {
    format!(
        r#"# Conduit Server Configuration
# Generated automatically on first run. Edit as needed.

[server]
bind_address = "{bind_address}"
# Node id baked into generated ids. Give every node a distinct value
# when running more than one.
worker_id = {worker_id}

[database]
# "sqlite" or "postgres"
engine = "{db_engine}"
url = "{db_url}"
max_connections = {max_connections}
# PostgreSQL session timeouts in seconds (0 = disabled):
# statement_timeout_secs = 30
# idle_in_transaction_timeout_secs = 60

[auth]
jwt_secret = "{jwt_secret}"
jwt_expiry_seconds = {jwt_expiry}
registration_enabled = {registration_enabled}

[graphql]
# Serve the GraphiQL editor on GET /graphql.
playground = {playground}
"#,
        bind_address = config.server.bind_address,
        worker_id = config.server.worker_id,
        db_engine = match config.database.engine {
            DatabaseEngine::Sqlite => "sqlite",
            DatabaseEngine::Postgres => "postgres",
        },
        db_url = config.database.url,
        max_connections = config.database.max_connections,
        jwt_secret = config.auth.jwt_secret,
        jwt_expiry = config.auth.jwt_expiry_seconds,
        registration_enabled = config.auth.registration_enabled,
        playground = config.graphql.playground,
    )
}

// ── Config Loading ───────────────────────────────────────────────────────────

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::info!(
                "Config file not found at '{}', generating defaults...",
                path
            );
            let config = Config::default();

            // Ensure parent directory exists
            if let Some(parent) = std::path::Path::new(path).parent() {
                fs::create_dir_all(parent)?;
            }

            let template = generate_config_template(&config);
            fs::write(path, &template)?;
            tracing::info!("Generated default config at '{}'", path);
            config
        };
        let _ = harden_secret_file_permissions(path);

        // Environment variable overrides
        if let Ok(value) = std::env::var("CONDUIT_BIND_ADDRESS") {
            config.server.bind_address = value;
        }
        if let Ok(value) = std::env::var("CONDUIT_WORKER_ID") {
            if let Ok(parsed) = value.parse::<u16>() {
                config.server.worker_id = parsed;
            }
        }
        if let Ok(value) = std::env::var("CONDUIT_DATABASE_URL") {
            config.database.url = value;
        }
        if let Ok(value) = std::env::var("CONDUIT_DATABASE_ENGINE") {
            let normalized = value.trim().to_ascii_lowercase();
            match normalized.as_str() {
                "sqlite" => config.database.engine = DatabaseEngine::Sqlite,
                "postgres" | "postgresql" => config.database.engine = DatabaseEngine::Postgres,
                _ => {
                    tracing::warn!(
                        "Ignoring invalid CONDUIT_DATABASE_ENGINE value '{}'; expected sqlite or postgres",
                        value
                    );
                }
            }
        }
        if let Ok(value) = std::env::var("CONDUIT_DATABASE_MAX_CONNECTIONS") {
            if let Ok(parsed) = value.parse::<u32>() {
                config.database.max_connections = parsed;
            }
        }
        if let Ok(value) = std::env::var("CONDUIT_DATABASE_STATEMENT_TIMEOUT_SECS") {
            if let Ok(parsed) = value.parse::<u64>() {
                config.database.statement_timeout_secs = parsed;
            }
        }
        if let Ok(value) = std::env::var("CONDUIT_DATABASE_IDLE_IN_TRANSACTION_TIMEOUT_SECS") {
            if let Ok(parsed) = value.parse::<u64>() {
                config.database.idle_in_transaction_timeout_secs = parsed;
            }
        }
        if let Ok(value) = std::env::var("CONDUIT_JWT_SECRET") {
            config.auth.jwt_secret = value;
        }
        if let Ok(value) = std::env::var("CONDUIT_JWT_EXPIRY_SECONDS") {
            if let Ok(parsed) = value.parse::<u64>() {
                config.auth.jwt_expiry_seconds = parsed;
            }
        }
        if let Ok(value) = std::env::var("CONDUIT_REGISTRATION_ENABLED") {
            if let Ok(parsed) = value.parse::<bool>() {
                config.auth.registration_enabled = parsed;
            }
        }
        if let Ok(value) = std::env::var("CONDUIT_GRAPHQL_PLAYGROUND") {
            if let Ok(parsed) = value.parse::<bool>() {
                config.graphql.playground = parsed;
            }
        }

        validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_config_template, Config, DatabaseConfig, DatabaseEngine};

    #[test]
    fn database_defaults_to_sqlite_engine() {
        let db = DatabaseConfig::default();
        assert_eq!(db.engine, DatabaseEngine::Sqlite);
        assert_eq!(db.max_connections, 20);
    }

    #[test]
    fn generated_template_round_trips_through_toml() {
        let config = Config::default();
        let template = generate_config_template(&config);
        let parsed: Config = toml::from_str(&template).expect("template should parse");
        assert_eq!(parsed.server.bind_address, config.server.bind_address);
        assert_eq!(parsed.auth.jwt_secret, config.auth.jwt_secret);
        assert_eq!(parsed.database.engine, config.database.engine);
        assert_eq!(parsed.graphql.playground, config.graphql.playground);
    }

    #[test]
    fn generated_secret_passes_validation() {
        let config = Config::default();
        assert!(config.auth.jwt_secret.len() >= 32);
        assert!(super::validate_config(&config).is_ok());
    }

    #[test]
    fn short_or_placeholder_secrets_are_rejected() {
        let mut config = Config::default();
        config.auth.jwt_secret = "too-short".into();
        assert!(super::validate_config(&config).is_err());

        config.auth.jwt_secret = "change_me_change_me_change_me_change_me".into();
        assert!(super::validate_config(&config).is_err());
    }

    #[test]
    fn oversized_worker_id_is_rejected() {
        let mut config = Config::default();
        config.server.worker_id = 1024;
        assert!(super::validate_config(&config).is_err());
    }

    #[test]
    fn missing_file_generates_a_loadable_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("conduit-test.toml");
        let path = config_path.to_str().expect("config path utf8");

        let config = Config::load(path).expect("load should generate defaults");
        assert!(config_path.exists());

        let reloaded = Config::load(path).expect("generated file should reload");
        assert_eq!(reloaded.server.bind_address, config.server.bind_address);
    }
}
