use rke2_inventory::{Generator, GeneratorConfig, NullOutputHandler, ClusterDefaults};
use std::sync::Arc;
use std::path::PathBuf;

#[test]
fn test_config_builder() {
    let defaults = ClusterDefaults {
        ansible_user: String::from("admin"),
        ..ClusterDefaults::default()
    };
    let config = GeneratorConfig::new()
        .inventory("/tmp/rke2.yml")
        .generated_configs("/tmp/configs")
        .cluster_name("lab")
        .defaults(defaults)
        .strict(true)
        .verbosity(3);

    assert_eq!(config.inventory_path, PathBuf::from("/tmp/rke2.yml"));
    assert_eq!(config.generated_configs_dir, PathBuf::from("/tmp/configs"));
    assert_eq!(config.cluster_name.as_deref(), Some("lab"));
    assert_eq!(config.defaults.ansible_user, "admin");
    assert_eq!(config.defaults.rke2_version, "v1.29.4+rke2r1");
    assert!(config.strict);
    assert_eq!(config.verbosity, 3);
}

#[test]
fn test_generator_creation() {
    let config = GeneratorConfig::new().inventory("/tmp/rke2.yml");
    let generator = Generator::new(config)
        .with_output_handler(Arc::new(NullOutputHandler));
    assert_eq!(generator.config().inventory_path, PathBuf::from("/tmp/rke2.yml"));
}

#[test]
fn test_error_display() {
    let missing = rke2_inventory::parse_hosts_file(std::path::Path::new("/nonexistent/hosts.txt")).unwrap_err();
    assert_eq!(missing.to_string(), "File not found: /nonexistent/hosts.txt");

    let bad = rke2_inventory::parse_hosts_str("[six_node]\nk1\n").unwrap_err();
    assert!(bad.to_string().starts_with("Parse error: "));
}
