// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Builds the configured gateway. Everything past this point sees only
//! `Arc<dyn Gateway>`; whether rows come from the hosted backend or the
//! embedded store is decided here and nowhere else.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use alma_remote::RemoteGateway;
use alma_store::{Gateway, LocalGateway};

use crate::config::{Config, GatewayMode};

pub fn open_demo_gateway() -> Result<Arc<dyn Gateway>> {
    let gateway = LocalGateway::open_memory()?;
    gateway.bootstrap()?;
    let summary = alma_testkit::seed_demo(&gateway).context("seed demo data")?;
    anyhow::ensure!(summary.students > 0, "demo seed produced no students");
    Ok(Arc::new(gateway))
}

pub fn open_configured_gateway(config: &Config, db_path: &Path) -> Result<Arc<dyn Gateway>> {
    match config.gateway_mode()? {
        GatewayMode::Local => {
            let gateway = LocalGateway::open(db_path).with_context(|| {
                format!(
                    "open database {} -- if this path is wrong, set [storage].db_path or ALMA_DB_PATH",
                    db_path.display()
                )
            })?;
            gateway.bootstrap()?;
            Ok(Arc::new(gateway))
        }
        GatewayMode::Remote => {
            let gateway =
                RemoteGateway::new(config.base_url(), config.api_key(), config.timeout()?)
                    .context("invalid [gateway] config; fix base_url/api_key/timeout values")?;
            Ok(Arc::new(gateway))
        }
    }
}

/// `--check` probes whatever the config points at so a broken deployment
/// fails fast instead of at first keypress.
pub fn check_gateway(config: &Config, db_path: &Path) -> Result<()> {
    match config.gateway_mode()? {
        GatewayMode::Local => {
            let gateway = LocalGateway::open(db_path)
                .with_context(|| format!("open database {}", db_path.display()))?;
            gateway.bootstrap()
        }
        GatewayMode::Remote => {
            let gateway =
                RemoteGateway::new(config.base_url(), config.api_key(), config.timeout()?)?;
            gateway
                .ping()
                .map_err(|error| anyhow::anyhow!("backend check failed: {error}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{check_gateway, open_configured_gateway, open_demo_gateway};
    use crate::config::Config;
    use alma_store::ListFilter;
    use anyhow::Result;

    #[test]
    fn demo_gateway_is_seeded_and_queryable() -> Result<()> {
        let gateway = open_demo_gateway()?;
        let students = gateway
            .list("students", &ListFilter::new())
            .map_err(|error| anyhow::anyhow!("{error}"))?;
        assert!(!students.is_empty());
        Ok(())
    }

    #[test]
    fn local_gateway_opens_and_checks_against_a_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let db_path = temp.path().join("alma.db");
        let config = Config::default();

        let gateway = open_configured_gateway(&config, &db_path)?;
        let rows = gateway
            .list("students", &ListFilter::new())
            .map_err(|error| anyhow::anyhow!("{error}"))?;
        assert!(rows.is_empty());
        drop(gateway);

        check_gateway(&config, &db_path)?;
        Ok(())
    }
}
