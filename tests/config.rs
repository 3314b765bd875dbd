use thermodog::node_mgmt::config;

mod stubs;

#[test]
fn test_parse_example_config() {
    let parsed = config::from_str(stubs::config::PAYLOAD_1).unwrap();
    assert_eq!(parsed.thermostats.len(), 2);
    assert_eq!(
        parsed.token_file(),
        std::path::PathBuf::from("/var/lib/thermodog/ecobee_token.json")
    );
    assert!(!parsed.thermostats[0].write_enabled("write_cool_2"));
    assert!(parsed.thermostats[0].write_enabled("write_cool_1"));
}

#[test]
fn test_parse_bad_config() {
    assert!(config::from_str(stubs::config::BAD_PAYLOAD).is_err());
}
