/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use unembedder::app_config::Config;
use unembedder::app_controller::Controller;
use crate::common;

/// A missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::from_file(&path)?, Config::default());
    Ok(())
}

/// An existing config file is loaded, with defaults for missing keys
#[test]
fn test_load_or_create_withPartialFile_shouldKeepUserValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{ "extraction": { "similarity_threshold": 0.8 }, "keep_intermediate": false }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.extraction.similarity_threshold, 0.8);
    assert!(!config.keep_intermediate);
    assert_eq!(config.extraction.frame_step, 1);
    // The user's file is left untouched
    assert!(std::fs::read_to_string(&path)?.contains("0.8"));
    Ok(())
}

/// The controller starts from the default configuration
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    assert_eq!(controller.config(), &Config::default());
    Ok(())
}

/// A configured dictionary that cannot be read fails controller creation
#[test]
fn test_controller_initialization_withMissingDictionary_shouldFail() {
    let mut config = Config::default();
    config.spelling.dictionary_path = Some("/definitely/not/here.txt".into());

    assert!(Controller::with_config(config).is_err());
}
