use super::*;
use crate::commands::dataset_cmd::OutputFormat;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_show_command() {
    let cli = Cli::try_parse_from([
        "martcfg",
        "show",
        "--source",
        "marts",
        "--dataset",
        "snp",
        "--internal-name",
        "snp_config",
        "--format",
        "json",
    ])
    .unwrap();

    assert!(cli.config.is_none());
    match cli.command {
        Commands::Show(args) => {
            assert_eq!(args.source, PathBuf::from("marts"));
            assert_eq!(args.internal_name, "snp_config");
            assert_eq!(args.format, OutputFormat::Json);
        }
        _ => panic!("Expected show command"),
    }
}

#[test]
fn test_config_flag_is_global() {
    let cli = Cli::try_parse_from([
        "martcfg",
        "datasets",
        "--source",
        "marts",
        "--config",
        "settings.toml",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("settings.toml")));
}

#[test]
fn test_specialize_requires_target_flag() {
    let result = Cli::try_parse_from([
        "martcfg",
        "specialize",
        "--source",
        "marts",
        "--dataset",
        "gene",
        "--internal-name",
        "gene_template",
    ]);

    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_reports_bad_settings_file() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(dir.path().join("snp.toml"), "[dataset_config]\ninternalName = \"snp_config\"\ndataset = \"snp\"\n")
        .expect("Failed to write snp.toml");
    let source = dir.path().to_string_lossy().into_owned();
    let settings = dir.path().join("absent.toml").to_string_lossy().into_owned();

    let cli = Cli::try_parse_from(["martcfg", "--config", &settings, "datasets", "--source", &source])
        .unwrap();
    assert!(matches!(run(&cli).await, Err(Error::Configuration(_))));

    let cli = Cli::try_parse_from(["martcfg", "datasets", "--source", &source]).unwrap();
    let output = run(&cli).await.unwrap();
    assert!(output.contains("snp_config"));
}

#[tokio::test]
async fn test_run_version() {
    let cli = Cli::try_parse_from(["martcfg", "version"]).unwrap();
    let output = run(&cli).await.unwrap();

    assert!(output.starts_with("martcfg version "));
}
