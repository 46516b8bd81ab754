use dotenvy::dotenv;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
struct Cli {
    port: Option<u16>,
    config: Option<String>,
}

fn parse_cli_from_args<I, S>(args: I) -> Cli
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut cli = Cli::default();
    let mut iter = args.into_iter().map(Into::into);

    // Skip binary name
    let _ = iter.next();

    while let Some(arg) = iter.next() {
        if let Some(raw_port) = arg.strip_prefix("--port=") {
            if let Ok(port) = raw_port.parse::<u16>() {
                cli.port = Some(port);
            }
            continue;
        }

        if arg == "--port" {
            if let Some(raw_port) = iter.next() {
                if let Ok(port) = raw_port.parse::<u16>() {
                    cli.port = Some(port);
                }
            }
            continue;
        }

        if let Some(raw_config) = arg.strip_prefix("--config=") {
            if !raw_config.is_empty() {
                cli.config = Some(raw_config.to_string());
            }
            continue;
        }

        if arg == "--config" {
            if let Some(config) = iter.next() {
                if !config.is_empty() {
                    cli.config = Some(config);
                }
            }
        }
    }

    cli
}

fn parse_cli() -> Cli {
    parse_cli_from_args(std::env::args())
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub port: u16,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    pub s3: S3Settings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout_seconds() -> u64 {
    5
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    S3,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Store an MD5 of every upload. Off by default, checksums are left empty.
    #[serde(default)]
    pub compute_checksums: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthSettings {
    /// Comma separated list of allowed browser origins.
    pub frontend_origin: Option<String>,
    #[serde(default)]
    pub jwt: JwtSettings,
}

/// Tokens are minted by the external identity service; this side only
/// verifies them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Option<String>,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            issuer: "modmarket".to_string(),
            audience: "modmarket".to_string(),
            signing_key: None,
        }
    }
}

impl Settings {
    #[allow(clippy::result_large_err)]
    pub fn new() -> Result<Self, figment::Error> {
        dotenv().ok();
        let cli = parse_cli();

        let mut figment = Self::base_figment();

        figment = figment.merge(Toml::file("/etc/modmarket/config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("modmarket/config.toml")));
        }

        figment = figment.merge(Toml::file("modmarket.toml"));

        let config_path = cli
            .config
            .or_else(|| std::env::var("MODMARKET_CONFIG_PATH").ok());
        if let Some(config_path) = config_path {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(Env::prefixed("MODMARKET_").split("__"));

        if let Some(port) = cli.port {
            figment = figment.merge(("port", port));
        }

        figment.extract()
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 3000,
            debug: false,
            database: DatabaseSettings {
                url: "sqlite://modmarket.db?mode=rwc".to_string(),
                max_connections: default_max_connections(),
                connect_timeout_seconds: default_connect_timeout_seconds(),
            },
            storage: StorageSettings::default(),
            s3: S3Settings {
                bucket: "modmarket-assets".to_string(),
                region: "us-east-1".to_string(),
                endpoint: None,
                access_key_id: None,
                secret_access_key: None,
                force_path_style: false,
            },
            auth: AuthSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cli_ignores_unknown_flags() {
        let cli = parse_cli_from_args(["api-bin", "--quiet", "--nocapture", "--port", "4010"]);

        assert_eq!(cli.port, Some(4010));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn parse_cli_supports_equals_syntax() {
        let cli = parse_cli_from_args(["api-bin", "--config=local.toml", "--port=3111"]);

        assert_eq!(cli.port, Some(3111));
        assert_eq!(cli.config.as_deref(), Some("local.toml"));
    }

    #[test]
    fn parse_cli_ignores_invalid_port_values() {
        let cli = parse_cli_from_args(["api-bin", "--port", "invalid"]);

        assert_eq!(cli.port, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn toml_overrides_nested_defaults() {
        let settings: Settings = Settings::base_figment()
            .merge(Toml::string(
                r#"
                [storage]
                backend = "memory"
                compute_checksums = true

                [auth.jwt]
                signing_key = "secret"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(settings.storage.backend, StorageBackendKind::Memory);
        assert!(settings.storage.compute_checksums);
        assert_eq!(settings.auth.jwt.signing_key.as_deref(), Some("secret"));
        assert_eq!(settings.auth.jwt.issuer, "modmarket");
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.database.max_connections, 10);
    }
}
