use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

/// Lowest failure delay accepted for login and re-authentication.
pub const MIN_FAILURE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }

/// Which value a freshly issued token carries in its `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleClaimFormat {
    /// The role's opaque id (UUID string).
    #[default]
    Id,
    /// The role's name, e.g. `admin`.
    Name,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default = "default_jwt_expires_in")]
    pub jwt_expires_in: i64,
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,
    #[serde(default)]
    pub role_claim: RoleClaimFormat,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(default = "default_role")]
    pub default_role: String,
    #[serde(default)]
    pub argon2: Argon2Config,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expires_in: default_jwt_expires_in(),
            failure_delay_ms: default_failure_delay_ms(),
            role_claim: RoleClaimFormat::default(),
            roles: default_roles(),
            default_role: default_role(),
            argon2: Argon2Config::default(),
        }
    }
}

fn default_jwt_expires_in() -> i64 { 3600 }
fn default_failure_delay_ms() -> u64 { MIN_FAILURE_DELAY_MS }
fn default_roles() -> Vec<String> { vec!["admin".into(), "manager".into(), "customer".into()] }
fn default_role() -> String { "customer".into() }

/// Argon2 cost parameters. Defaults mirror `argon2::Params::DEFAULT`.
#[derive(Debug, Clone, Deserialize)]
pub struct Argon2Config {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_memory_kib() -> u32 { 19 * 1024 }
fn default_iterations() -> u32 { 2 }
fn default_parallelism() -> u32 { 1 }

/// Startup seeding of demo data. Roles are always seeded.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub demo_users: bool,
    #[serde(default = "default_true")]
    pub demo_products: bool,
    #[serde(default = "default_demo_product_count")]
    pub demo_product_count: usize,
    #[serde(default = "default_demo_password")]
    pub demo_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            demo_users: false,
            demo_products: true,
            demo_product_count: default_demo_product_count(),
            demo_password: default_demo_password(),
        }
    }
}

fn default_true() -> bool { true }
fn default_demo_product_count() -> usize { 20 }
fn default_demo_password() -> String { "1234".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    from_toml_str(&content)
}

pub fn from_toml_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Read `config.toml` (or `CONFIG_PATH`) when present, otherwise start
    /// from defaults; then overlay environment variables and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!(error = %e, "config file unavailable, using defaults + env");
                AppConfig::default()
            }
        };
        cfg.apply_env();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment variables override whatever the file provided.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        self.database.normalize_from_env();
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(ttl) = std::env::var("JWT_EXPIRESIN").ok().and_then(|v| v.parse::<i64>().ok()) {
            self.auth.jwt_expires_in = ttl;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.normalize_and_validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    /// Rejects configurations that would let the server hand out tokens it
    /// cannot sign properly, and clamps the failure delay to its floor.
    pub fn normalize_and_validate(&mut self) -> Result<()> {
        match self.jwt_secret.as_deref() {
            Some(s) if !s.trim().is_empty() => {}
            _ => return Err(anyhow!("auth.jwt_secret is missing; set it in config.toml or JWT_SECRET")),
        }
        if self.jwt_expires_in <= 0 {
            return Err(anyhow!("auth.jwt_expires_in must be a positive number of seconds"));
        }
        if self.failure_delay_ms < MIN_FAILURE_DELAY_MS {
            self.failure_delay_ms = MIN_FAILURE_DELAY_MS;
        }
        self.roles.retain(|r| !r.trim().is_empty());
        if self.roles.is_empty() {
            return Err(anyhow!("auth.roles must name at least one role"));
        }
        if !self.roles.iter().any(|r| r == &self.default_role) {
            return Err(anyhow!("auth.default_role `{}` is not listed in auth.roles", self.default_role));
        }
        Ok(())
    }
}
