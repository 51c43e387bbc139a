// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alma_app::ids::UserId;
use alma_app::session::{CurrentUser, Role};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";

/// Whether the portal talks to the hosted backend or to its embedded
/// store. One top-level switch; nothing downstream ever re-decides this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub session: Session,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            gateway: GatewaySection::default(),
            storage: Storage::default(),
            session: Session::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    pub mode: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            mode: Some("local".to_owned()),
            base_url: None,
            api_key: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub user_id: Option<i64>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user_id: Some(1),
            role: Some("admin".to_owned()),
            name: Some("Portal Admin".to_owned()),
            email: Some("admin@college.edu".to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("ALMA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set ALMA_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(alma_store::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [gateway], [storage], and [session]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        self.gateway_mode().with_context(|| {
            format!("invalid [gateway].mode in {}", path.display())
        })?;

        if self.gateway_mode()? == GatewayMode::Remote && self.gateway.base_url.is_none() {
            bail!(
                "[gateway].mode = \"remote\" in {} requires [gateway].base_url",
                path.display()
            );
        }

        if let Some(db_path) = &self.storage.db_path {
            alma_store::validate_db_path(db_path)?;
        }

        if let Some(timeout) = &self.gateway.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "[gateway].timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        self.current_user().with_context(|| {
            format!("invalid [session] in {}", path.display())
        })?;

        Ok(())
    }

    pub fn gateway_mode(&self) -> Result<GatewayMode> {
        match self.gateway.mode.as_deref().unwrap_or("local") {
            "local" => Ok(GatewayMode::Local),
            "remote" => Ok(GatewayMode::Remote),
            other => bail!("gateway mode must be \"local\" or \"remote\", got {other:?}"),
        }
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => alma_store::default_db_path(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.gateway.base_url.as_deref().unwrap_or("")
    }

    pub fn api_key(&self) -> Option<&str> {
        self.gateway.api_key.as_deref()
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.gateway.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn current_user(&self) -> Result<CurrentUser> {
        let role_raw = self.session.role.as_deref().unwrap_or("admin");
        let role = Role::parse(role_raw)
            .ok_or_else(|| anyhow!("unknown session role {role_raw:?}"))?;
        let user_id = self.session.user_id.unwrap_or(1);
        if user_id <= 0 {
            bail!("session user_id must be positive, got {user_id}");
        }
        Ok(CurrentUser {
            user_id: UserId::new(user_id),
            role,
            name: self
                .session
                .name
                .clone()
                .unwrap_or_else(|| "Portal Admin".to_owned()),
            email: self
                .session
                .email
                .clone()
                .unwrap_or_else(|| "admin@college.edu".to_owned()),
        })
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# alma portal config\n# Place this file at: {}\n\nversion = 1\n\n[gateway]\n# \"local\" keeps records in an embedded database; \"remote\" talks to the\n# hosted backend.\nmode = \"local\"\n# base_url = \"https://backend.college.edu/api\"\n# api_key = \"...\"\ntimeout = \"10s\"\n\n[storage]\n# Optional. Default is the platform data dir (for example ~/.local/share/alma/alma.db)\n# db_path = \"/absolute/path/to/alma.db\"\n\n[session]\nuser_id = 1\nrole = \"admin\"\nname = \"Portal Admin\"\nemail = \"admin@college.edu\"\n",
            path.display(),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
