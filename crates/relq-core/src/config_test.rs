use super::*;
use std::io::Write;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config = NormalizeConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, NormalizeConfig::default());
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    assert!(config.passes.partial_evaluation);
    assert!(config.passes.closure_expansion);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
max_depth: 64
passes:
  partial_evaluation: false
  constant_resolution: true
  queryable_reduction: true
  enumerable_reduction: false
  closure_expansion: true
"#;
    let config = NormalizeConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.max_depth, 64);
    assert!(!config.passes.partial_evaluation);
    assert!(config.passes.constant_resolution);
    assert!(!config.passes.enumerable_reduction);
}

#[test]
fn test_partial_passes_section_defaults_rest() {
    let yaml = r#"
passes:
  closure_expansion: false
"#;
    let config = NormalizeConfig::from_yaml_str(yaml).unwrap();
    assert!(!config.passes.closure_expansion);
    assert!(config.passes.queryable_reduction);
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
}

#[test]
fn test_unknown_field_rejected() {
    let result = NormalizeConfig::from_yaml_str("max_dpth: 10");
    assert!(matches!(result, Err(CoreError::YamlParse(_))));
}

#[test]
fn test_zero_depth_rejected() {
    let result = NormalizeConfig::from_yaml_str("max_depth: 0");
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = NormalizeConfig::load(&dir.path().join("relq.yml"));
    assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
}

#[test]
fn test_load_from_dir_prefers_yml() {
    let dir = tempfile::tempdir().unwrap();
    let mut yml = std::fs::File::create(dir.path().join("relq.yml")).unwrap();
    writeln!(yml, "max_depth: 32").unwrap();
    let mut yaml = std::fs::File::create(dir.path().join("relq.yaml")).unwrap();
    writeln!(yaml, "max_depth: 16").unwrap();

    let config = NormalizeConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.max_depth, 32);
}

#[test]
fn test_load_from_dir_without_config() {
    let dir = tempfile::tempdir().unwrap();
    let err = NormalizeConfig::load_from_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("RC001"));
}
