//! The poll loop: fetch, map and publish every configured thermostat on a
//! fixed interval, forever.

use std::collections::HashMap;
use std::thread;

use anyhow::Result;
use chrono::Utc;

use crate::constants::defaults;
use crate::data_mgmt::{mapper, publish};
use crate::interfaces::datadog::DatadogClient;
use crate::interfaces::ecobee::{EcobeeClient, EcobeeError, Thermostat};
use crate::interfaces::http_agent;
use crate::node_mgmt::config::{Config, ThermostatConfig};
use crate::node_mgmt::token::TokenStore;

pub fn run(config: Config) -> Result<()> {
    let agent = http_agent()?;
    let ecobee = EcobeeClient::new(agent.clone(), defaults::ECOBEE_API_ROOT, &config.api_key);
    let datadog = DatadogClient::new(
        agent,
        defaults::DATADOG_API_ROOT,
        &config.datadog_api_key,
        &config.datadog_app_key,
    );

    // Missing or denied authorization at startup is fatal
    let mut tokens = TokenStore::open(config.token_file())?;
    tokens.ensure_authorized(&ecobee)?;

    let mut last_intervals: HashMap<String, i64> = HashMap::new();
    let interval = config.poll_interval();

    loop {
        log::info!(
            "Starting poll cycle for {} thermostat(s)",
            config.thermostats.len()
        );
        run_cycle(&config, &ecobee, &datadog, &mut tokens, &mut last_intervals);
        log::info!("Poll cycle complete; sleeping for {}s", interval.as_secs());
        thread::sleep(interval);
    }
}

/// One cycle over the device list. Per-device failures are logged and never
/// abort the cycle.
fn run_cycle(
    config: &Config,
    ecobee: &EcobeeClient,
    datadog: &DatadogClient,
    tokens: &mut TokenStore,
    last_intervals: &mut HashMap<String, i64>,
) {
    for thermostat_cfg in &config.thermostats {
        match process_thermostat(thermostat_cfg, ecobee, datadog, tokens, last_intervals) {
            Ok(published) => {
                log::info!(
                    "Thermostat {}: published {} metric point(s)",
                    thermostat_cfg.id,
                    published
                );
            }
            Err(e) => {
                log::error!("Error processing thermostat {}: {:#}", thermostat_cfg.id, e);
            }
        }
    }
}

fn process_thermostat(
    thermostat_cfg: &ThermostatConfig,
    ecobee: &EcobeeClient,
    datadog: &DatadogClient,
    tokens: &mut TokenStore,
    last_intervals: &mut HashMap<String, i64>,
) -> Result<usize> {
    let snapshot = fetch_with_refresh(thermostat_cfg, ecobee, tokens)?;

    let map_opts = mapper::MapOptions {
        now: Utc::now(),
        last_runtime_interval: last_intervals.get(&thermostat_cfg.id).copied(),
    };
    let points = mapper::map(&snapshot, thermostat_cfg, &map_opts);
    let mapped_runtime = points
        .iter()
        .any(|p| p.name.starts_with(mapper::RUNTIME_METRIC_PREFIX));
    let published = publish::publish_points(datadog, &points)?;

    // Only record the interval once its runtime metrics actually went out;
    // a snapshot can carry an interval number without a mappable extended
    // runtime block (e.g. missing reading timestamp)
    if mapped_runtime {
        if let Some(interval) = snapshot
            .extended_runtime
            .as_ref()
            .and_then(|ext| ext.runtime_interval)
        {
            last_intervals.insert(thermostat_cfg.id.clone(), interval);
        }
    }
    Ok(published)
}

/// Fetch the device snapshot; on a rejected access token, refresh once and
/// retry the same fetch exactly once.
fn fetch_with_refresh(
    thermostat_cfg: &ThermostatConfig,
    ecobee: &EcobeeClient,
    tokens: &mut TokenStore,
) -> Result<Thermostat> {
    let access_token = tokens.get_valid_token(ecobee)?;
    match ecobee.fetch_snapshot(&access_token, &thermostat_cfg.id) {
        Err(EcobeeError::AuthExpired) => {
            log::warn!(
                "Access token rejected fetching thermostat {}; refreshing and retrying once",
                thermostat_cfg.id
            );
            let access_token = tokens.force_refresh(ecobee)?;
            Ok(ecobee.fetch_snapshot(&access_token, &thermostat_cfg.id)?)
        }
        other => Ok(other?),
    }
}
