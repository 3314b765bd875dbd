//! Pure mapping from one thermostat snapshot to metric points.
//!
//! Deterministic: the same snapshot, device config and options always yield
//! the same points in the same order. Missing or unparsable vendor fields
//! are skipped outright, never coerced to zero.

use chrono::{DateTime, Duration, Utc};

use crate::helpers::parse_ecobee_time;
use crate::interfaces::ecobee::{ExtendedRuntime, Thermostat};
use crate::node_mgmt::config::ThermostatConfig;

use super::models::MetricPoint;

/// Name prefix shared by all extended-runtime metrics
pub const RUNTIME_METRIC_PREFIX: &str = "ecobee.runtime.";

/// All write-option keys recognised by the mapper
pub const WRITE_OPTIONS: [&str; 14] = [
    "write_temperature",
    "write_humidity",
    "write_fan",
    "write_aux_heat_1",
    "write_aux_heat_2",
    "write_heat_pump_1",
    "write_heat_pump_2",
    "write_cool_1",
    "write_cool_2",
    "write_humidifier",
    "write_dehumidifier",
    "write_air_quality",
    "write_sensors",
    "write_weather",
];

/// Equipment stages: (write option, metric name, field accessor)
const STAGE_RUNTIMES: [(&str, &str, fn(&ExtendedRuntime) -> &Vec<i64>); 6] = [
    ("write_aux_heat_1", "ecobee.runtime.aux_heat_1_run_time", |e| &e.aux_heat_1),
    ("write_aux_heat_2", "ecobee.runtime.aux_heat_2_run_time", |e| &e.aux_heat_2),
    ("write_heat_pump_1", "ecobee.runtime.heat_pump_1_run_time", |e| &e.heat_pump_1),
    ("write_heat_pump_2", "ecobee.runtime.heat_pump_2_run_time", |e| &e.heat_pump_2),
    ("write_cool_1", "ecobee.runtime.cool_1_run_time", |e| &e.cool_1),
    ("write_cool_2", "ecobee.runtime.cool_2_run_time", |e| &e.cool_2),
];

/// Extended runtime reporting granularity
const RUNTIME_INTERVAL_MINUTES: i64 = 5;

#[derive(Clone, Debug)]
pub struct MapOptions {
    /// Wall-clock time of this poll cycle
    pub now: DateTime<Utc>,
    /// `runtimeInterval` already published for this device, if any; a
    /// matching snapshot's extended-runtime block is withheld to avoid
    /// rewriting identical intervals
    pub last_runtime_interval: Option<i64>,
}

pub fn map(
    thermostat: &Thermostat,
    cfg: &ThermostatConfig,
    opts: &MapOptions,
) -> Vec<MetricPoint> {
    let tags = vec![format!("thermostat_name:{}", thermostat.name)];
    let mut points = Vec::new();

    map_air_quality(thermostat, cfg, &tags, &mut points);
    map_extended_runtime(thermostat, cfg, opts, &tags, &mut points);
    map_sensors(thermostat, cfg, &tags, &mut points);
    map_weather(thermostat, cfg, opts, &tags, &mut points);

    points
}

fn map_air_quality(
    thermostat: &Thermostat,
    cfg: &ThermostatConfig,
    tags: &[String],
    points: &mut Vec<MetricPoint>,
) {
    if !cfg.write_enabled("write_air_quality") {
        return;
    }
    let Some(runtime) = &thermostat.runtime else {
        return;
    };
    let Some(ts) = runtime
        .last_status_modified
        .as_deref()
        .and_then(parse_ecobee_time)
    else {
        return;
    };
    let ts = ts.timestamp();

    let air_quality = [
        ("ecobee.air_quality.accuracy", runtime.aq_accuracy),
        ("ecobee.air_quality.score", runtime.aq_score),
        ("ecobee.air_quality.co2", runtime.co2),
        ("ecobee.air_quality.voc", runtime.voc),
    ];
    for (name, value) in air_quality {
        if let Some(value) = value {
            points.push(MetricPoint::gauge(name, value, ts, tags.to_vec()));
        }
    }
}

fn map_extended_runtime(
    thermostat: &Thermostat,
    cfg: &ThermostatConfig,
    opts: &MapOptions,
    tags: &[String],
    points: &mut Vec<MetricPoint>,
) {
    let Some(ext) = &thermostat.extended_runtime else {
        return;
    };
    // The vendor re-reports the same three intervals until a new one closes
    if ext.runtime_interval.is_some() && ext.runtime_interval == opts.last_runtime_interval {
        log::debug!(
            "Runtime interval {:?} already published for {}; skipping extended runtime",
            ext.runtime_interval,
            thermostat.name
        );
        return;
    }
    let Some(base_ts) = ext
        .last_reading_timestamp
        .as_deref()
        .and_then(parse_ecobee_time)
    else {
        return;
    };

    for i in 0..3 {
        let offset = Duration::minutes((i as i64 - 1) * RUNTIME_INTERVAL_MINUTES);
        let ts = (base_ts + offset).timestamp();

        if cfg.write_enabled("write_temperature") {
            push_temperature_pair(
                points,
                "ecobee.runtime.temperature",
                ext.actual_temperature.get(i),
                ts,
                tags,
            );
            push_temperature_pair(
                points,
                "ecobee.runtime.heat_set_point",
                ext.desired_heat.get(i),
                ts,
                tags,
            );
            push_temperature_pair(
                points,
                "ecobee.runtime.cool_set_point",
                ext.desired_cool.get(i),
                ts,
                tags,
            );
            push_temperature_pair(
                points,
                "ecobee.runtime.demand_mgmt_offset",
                ext.dm_offset.get(i),
                ts,
                tags,
            );
        }

        if cfg.write_enabled("write_humidity") {
            if let Some(&humidity) = ext.actual_humidity.get(i) {
                points.push(MetricPoint::gauge(
                    "ecobee.runtime.humidity",
                    humidity as f64,
                    ts,
                    tags.to_vec(),
                ));
            }
        }

        if cfg.write_enabled("write_fan") {
            if let Some(&fan) = ext.fan.get(i) {
                points.push(MetricPoint::count(
                    "ecobee.runtime.fan_run_time",
                    fan as f64,
                    ts,
                    tags.to_vec(),
                ));
            }
        }

        for (option, metric, accessor) in STAGE_RUNTIMES {
            if !cfg.write_enabled(option) {
                continue;
            }
            if let Some(&run_time) = accessor(ext).get(i) {
                points.push(MetricPoint::count(metric, run_time as f64, ts, tags.to_vec()));
            }
        }

        if cfg.write_enabled("write_humidifier") {
            if let Some(&set_point) = ext.desired_humidity.get(i) {
                points.push(MetricPoint::gauge(
                    "ecobee.runtime.humidity_set_point",
                    set_point as f64,
                    ts,
                    tags.to_vec(),
                ));
            }
            if let Some(&run_time) = ext.humidifier.get(i) {
                points.push(MetricPoint::count(
                    "ecobee.runtime.humidifier_run_time",
                    run_time as f64,
                    ts,
                    tags.to_vec(),
                ));
            }
        }

        if cfg.write_enabled("write_dehumidifier") {
            if let Some(&set_point) = ext.desired_dehumidity.get(i) {
                points.push(MetricPoint::gauge(
                    "ecobee.runtime.dehumidity_set_point",
                    set_point as f64,
                    ts,
                    tags.to_vec(),
                ));
            }
            if let Some(&run_time) = ext.dehumidifier.get(i) {
                points.push(MetricPoint::count(
                    "ecobee.runtime.dehumidifier_run_time",
                    run_time as f64,
                    ts,
                    tags.to_vec(),
                ));
            }
        }
    }
}

fn map_sensors(
    thermostat: &Thermostat,
    cfg: &ThermostatConfig,
    tags: &[String],
    points: &mut Vec<MetricPoint>,
) {
    if !cfg.write_enabled("write_sensors") {
        return;
    }
    let Some(ts) = thermostat.utc_time.as_deref().and_then(parse_ecobee_time) else {
        return;
    };
    let ts = ts.timestamp();

    for sensor in &thermostat.remote_sensors {
        let mut sensor_tags = tags.to_vec();
        sensor_tags.push(format!("sensor_name:{}", sensor.name));

        for capability in &sensor.capability {
            let Some(raw) = capability.value.as_deref() else {
                continue;
            };
            match capability.kind.as_str() {
                "temperature" => {
                    // Tenths of °F as a string; anything unparsable is dropped
                    let Ok(tenths) = raw.parse::<f64>() else {
                        continue;
                    };
                    let temp_f = tenths / 10.0;
                    points.push(MetricPoint::gauge(
                        "ecobee.sensor.temperature_f",
                        temp_f,
                        ts,
                        sensor_tags.clone(),
                    ));
                    points.push(MetricPoint::gauge(
                        "ecobee.sensor.temperature_c",
                        f_to_c(temp_f),
                        ts,
                        sensor_tags.clone(),
                    ));
                }
                "occupancy" => {
                    let occupied = if raw == "true" { 1.0 } else { 0.0 };
                    points.push(MetricPoint::gauge(
                        "ecobee.sensor.occupied",
                        occupied,
                        ts,
                        sensor_tags.clone(),
                    ));
                }
                "humidity" => {
                    let Ok(humidity) = raw.parse::<f64>() else {
                        continue;
                    };
                    points.push(MetricPoint::gauge(
                        "ecobee.sensor.humidity",
                        humidity,
                        ts,
                        sensor_tags.clone(),
                    ));
                }
                _ => {}
            }
        }
    }
}

fn map_weather(
    thermostat: &Thermostat,
    cfg: &ThermostatConfig,
    opts: &MapOptions,
    tags: &[String],
    points: &mut Vec<MetricPoint>,
) {
    if !cfg.write_enabled("write_weather") {
        return;
    }
    let Some(weather) = &thermostat.weather else {
        return;
    };
    let Some(forecast) = weather.forecasts.first() else {
        return;
    };

    // Station observations can lag by a while; optionally stamp them with
    // the poll time so dashboards line up with the polling cadence
    let ts = if cfg.always_write_weather_as_current {
        opts.now.timestamp()
    } else {
        match weather.timestamp.as_deref().and_then(parse_ecobee_time) {
            Some(observed) => observed.timestamp(),
            None => return,
        }
    };

    push_temperature_pair(points, "ecobee.weather.temperature", forecast.temperature.as_ref(), ts, tags);
    push_temperature_pair(points, "ecobee.weather.dewpoint", forecast.dewpoint.as_ref(), ts, tags);

    let gauges = [
        ("ecobee.weather.relative_humidity", forecast.relative_humidity),
        ("ecobee.weather.pressure", forecast.pressure),
        ("ecobee.weather.wind_speed", forecast.wind_speed),
        ("ecobee.weather.wind_bearing", forecast.wind_bearing),
        ("ecobee.weather.visibility", forecast.visibility),
    ];
    for (name, value) in gauges {
        if let Some(value) = value {
            points.push(MetricPoint::gauge(name, value as f64, ts, tags.to_vec()));
        }
    }
}

/// Emit `<base>_f` and `<base>_c` from a raw tenths-of-°F reading
fn push_temperature_pair(
    points: &mut Vec<MetricPoint>,
    base_name: &str,
    raw_tenths: Option<&i64>,
    ts: i64,
    tags: &[String],
) {
    let Some(&raw) = raw_tenths else {
        return;
    };
    let degrees_f = raw as f64 / 10.0;
    points.push(MetricPoint::gauge(
        format!("{base_name}_f"),
        degrees_f,
        ts,
        tags.to_vec(),
    ));
    points.push(MetricPoint::gauge(
        format!("{base_name}_c"),
        f_to_c(degrees_f),
        ts,
        tags.to_vec(),
    ));
}

fn f_to_c(degrees_f: f64) -> f64 {
    (degrees_f - 32.0) * 5.0 / 9.0
}
