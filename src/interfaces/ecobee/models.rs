//! Wire models for the ecobee thermostat endpoint.
//!
//! Every leaf field is optional (or defaults to empty); the mapper skips
//! anything the vendor did not report instead of substituting zeroes.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThermostatResponse {
    pub thermostat_list: Vec<Thermostat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thermostat {
    pub name: String,
    /// Thermostat time in UTC, `YYYY-MM-DD HH:MM:SS`
    pub utc_time: Option<String>,
    pub runtime: Option<Runtime>,
    pub extended_runtime: Option<ExtendedRuntime>,
    pub remote_sensors: Vec<RemoteSensor>,
    pub weather: Option<Weather>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Runtime {
    pub last_status_modified: Option<String>,
    #[serde(rename = "actualAQAccuracy")]
    pub aq_accuracy: Option<f64>,
    #[serde(rename = "actualAQScore")]
    pub aq_score: Option<f64>,
    #[serde(rename = "actualCO2")]
    pub co2: Option<f64>,
    #[serde(rename = "actualVOC")]
    pub voc: Option<f64>,
}

/// Three 5-minute reading intervals per poll. Temperatures and setpoints are
/// reported in tenths of a degree Fahrenheit; equipment fields are runtime
/// seconds within the interval.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtendedRuntime {
    pub last_reading_timestamp: Option<String>,
    pub runtime_interval: Option<i64>,
    pub actual_temperature: Vec<i64>,
    pub actual_humidity: Vec<i64>,
    pub desired_heat: Vec<i64>,
    pub desired_cool: Vec<i64>,
    pub desired_humidity: Vec<i64>,
    pub desired_dehumidity: Vec<i64>,
    pub dm_offset: Vec<i64>,
    pub fan: Vec<i64>,
    pub humidifier: Vec<i64>,
    pub dehumidifier: Vec<i64>,
    pub aux_heat_1: Vec<i64>,
    pub aux_heat_2: Vec<i64>,
    pub heat_pump_1: Vec<i64>,
    pub heat_pump_2: Vec<i64>,
    pub cool_1: Vec<i64>,
    pub cool_2: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSensor {
    pub name: String,
    pub capability: Vec<SensorCapability>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SensorCapability {
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw string value; temperature comes as tenths of °F, occupancy as
    /// "true"/"false", humidity as an integer percentage
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weather {
    /// Observation time at the weather station, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: Option<String>,
    pub weather_station: Option<String>,
    pub forecasts: Vec<WeatherForecast>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherForecast {
    /// Tenths of °F
    pub temperature: Option<i64>,
    /// Tenths of °F
    pub dewpoint: Option<i64>,
    pub relative_humidity: Option<i64>,
    /// Millibars
    pub pressure: Option<i64>,
    pub wind_speed: Option<i64>,
    pub wind_bearing: Option<i64>,
    /// Meters
    pub visibility: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinResponse {
    pub ecobee_pin: String,
    pub code: String,
    /// Minimum seconds between polls of the token endpoint
    pub interval: u64,
    /// Minutes until the PIN expires
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}
