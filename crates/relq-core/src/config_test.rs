use super::*;
use std::io::Write;
use tempfile::TempDir;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config = CompilerConfig::from_yaml_str("").unwrap();
    assert_eq!(config, CompilerConfig::default());
    assert_eq!(config.subquery_alias_prefix, "t");
    assert_eq!(config.column_alias_prefix, "c");
    assert!(config.default_schema.is_none());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
subquery_alias_prefix: sq
column_alias_prefix: col
default_schema: dbo
"#;
    let config = CompilerConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.subquery_alias_prefix, "sq");
    assert_eq!(config.column_alias_prefix, "col");
    assert_eq!(config.default_schema.as_deref(), Some("dbo"));
}

#[test]
fn test_unknown_field_rejected() {
    let err = CompilerConfig::from_yaml_str("table_prefix: x").unwrap_err();
    assert!(matches!(err, CoreError::Yaml(_)));
}

#[test]
fn test_invalid_prefix_rejected() {
    let err = CompilerConfig::from_yaml_str("subquery_alias_prefix: ''").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));

    let err = CompilerConfig::from_yaml_str("column_alias_prefix: '1c'").unwrap_err();
    assert!(err.to_string().contains("column_alias_prefix"));

    let err = CompilerConfig::from_yaml_str("column_alias_prefix: 'c-x'").unwrap_err();
    assert!(err.to_string().contains("[E002]"));
}

#[test]
fn test_blank_default_schema_rejected() {
    let err = CompilerConfig::from_yaml_str("default_schema: '  '").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = CompilerConfig::load(&dir.path().join("relq.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_from_dir_prefers_yml() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("relq.yml"), "subquery_alias_prefix: a\n").unwrap();
    std::fs::write(dir.path().join("relq.yaml"), "subquery_alias_prefix: b\n").unwrap();

    let config = CompilerConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.subquery_alias_prefix, "a");
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = TempDir::new().unwrap();
    let mut file = std::fs::File::create(dir.path().join("relq.yaml")).unwrap();
    writeln!(file, "column_alias_prefix: expr").unwrap();

    let config = CompilerConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.column_alias_prefix, "expr");
    assert_eq!(config.subquery_alias_prefix, "t");
}

#[test]
fn test_load_from_empty_dir() {
    let dir = TempDir::new().unwrap();
    let err = CompilerConfig::load_from_dir(dir.path()).unwrap_err();
    match err {
        CoreError::ConfigNotFound { path } => assert!(path.ends_with("relq.yml")),
        other => panic!("expected ConfigNotFound, got {other:?}"),
    }
}
