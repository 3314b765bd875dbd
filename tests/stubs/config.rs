pub const PAYLOAD_1: &str = r#"{
    "api_key": "ecobee-key",
    "datadog_api_key": "dd-api",
    "datadog_app_key": "dd-app",
    "work_dir": "/var/lib/thermodog",
    "poll_interval_s": 300,
    "thermostats": [
        {
            "id": "411234567890",
            "write_options": {
                "write_aux_heat_1": false,
                "write_aux_heat_2": false,
                "write_cool_2": false,
                "write_dehumidifier": false
            },
            "always_write_weather_as_current": true
        },
        {
            "id": "419876543210",
            "write_options": {}
        }
    ]
}"#;

pub const BAD_PAYLOAD: &str = r#"{
    "api_key": "ecobee-key",
    "thermostats": "not-a-list"
}"#;
