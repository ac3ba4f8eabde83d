use super::*;
use std::io::Write;
use tempfile::TempDir;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config: ProjectConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, ProjectConfig::default());
    assert_eq!(config.warehouse, WarehouseType::DuckDb);
    assert_eq!(config.default_schema, "weft");
    assert_eq!(config.assertion_schema, "weft_assertions");
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
warehouse: snowflake
default_schema: analytics
assertion_schema: checks
schema_suffix: dev
default_database: prod
"#;
    let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.warehouse, WarehouseType::Snowflake);
    assert_eq!(config.default_schema, "analytics");
    assert_eq!(config.suffixed_schema("analytics"), "analytics_dev");
    assert_eq!(config.default_database.as_deref(), Some("prod"));
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<ProjectConfig, _> = serde_yaml::from_str("default_shema: typo");
    assert!(result.is_err());
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = ProjectConfig::load(&dir.path().join("weft.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_from_dir_prefers_yml() {
    let dir = TempDir::new().unwrap();
    let mut file = std::fs::File::create(dir.path().join("weft.yml")).unwrap();
    writeln!(file, "warehouse: redshift\ndefault_schema: marts").unwrap();

    let config = ProjectConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.warehouse, WarehouseType::Redshift);
    assert_eq!(config.default_schema, "marts");
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("weft.yaml"), "warehouse: bigquery\n").unwrap();
    let config = ProjectConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.warehouse, WarehouseType::BigQuery);
}

#[test]
fn test_load_parse_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("weft.yml"), "warehouse: [not, a, warehouse]\n").unwrap();
    let err = ProjectConfig::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
}

#[test]
fn test_invalid_suffix_rejected() {
    let config = ProjectConfig {
        schema_suffix: Some("dev-1".to_string()),
        ..ProjectConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_empty_default_schema_rejected() {
    let config = ProjectConfig {
        default_schema: String::new(),
        ..ProjectConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_with_overrides() {
    let config = ProjectConfig::default().with_overrides(Some("ci"), None);
    assert_eq!(config.default_schema, "ci");
    assert_eq!(config.assertion_schema, "weft_assertions");
}

#[test]
fn test_run_config_include_deps_requires_nodes() {
    let config = RunConfig {
        include_dependencies: true,
        ..RunConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(CoreError::RunConfigInvalid { .. })
    ));

    let config = RunConfig {
        nodes: vec!["orders".to_string()],
        include_dependencies: true,
        ..RunConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_warehouse_display_matches_serde() {
    for warehouse in [
        WarehouseType::BigQuery,
        WarehouseType::DuckDb,
        WarehouseType::Postgres,
        WarehouseType::Redshift,
        WarehouseType::Snowflake,
    ] {
        let json = serde_json::to_string(&warehouse).unwrap();
        assert_eq!(json, format!("\"{}\"", warehouse));
    }
}
