use super::*;

#[test]
fn test_configuration_error_display() {
    let error: Error = ConfigurationError::FileNotFound {
        path: "marts/snp.toml".to_string(),
    }
    .into();

    assert!(error.to_string().starts_with("Configuration error: "));
    assert!(error.to_string().contains("marts/snp.toml"));
}

#[test]
fn test_dataset_config_not_found_display() {
    let error = Error::DatasetConfigNotFound {
        dataset: "snp".to_string(),
        internal_name: "snp_config".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "No dataset config 'snp_config' for dataset 'snp'"
    );
}

#[test]
fn test_invalid_arguments_error_display() {
    let error = Error::InvalidArguments("--target is required".to_string());
    assert_eq!(error.to_string(), "Invalid arguments: --target is required");
}

#[test]
fn test_error_debug_format() {
    let error = Error::Render("bad".to_string());
    let debug_output = format!("{:?}", error);
    assert!(debug_output.contains("Render"));
    assert!(debug_output.contains("bad"));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
