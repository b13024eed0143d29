// tests/keywords_config.rs
use ki_job_tracker::config::{load_keywords_default, load_keywords_from, KeywordConfig, ENV_KEYWORDS_PATH};
use std::{env, fs};

#[test]
fn toml_and_json_files_both_load() {
    let dir = tempfile::tempdir().unwrap();

    let toml_p = dir.path().join("keywords.toml");
    fs::write(&toml_p, "high = [\"organoid\"]\nmedium = [\"crispr\"]\n").unwrap();
    let t = load_keywords_from(&toml_p).unwrap();
    assert_eq!(t.high, vec!["organoid".to_string()]);

    let json_p = dir.path().join("keywords.json");
    fs::write(&json_p, r#"{"high": ["ipsc"], "medium": []}"#).unwrap();
    let j = load_keywords_from(&json_p).unwrap();
    assert_eq!(j.high, vec!["ipsc".to_string()]);
    assert!(j.medium.is_empty());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_file_then_builtin() {
    // Isolate CWD in a temp dir so the repo's own config/ doesn't interfere.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_KEYWORDS_PATH);

    // No files anywhere: built-in defaults.
    let builtin = load_keywords_default().unwrap();
    assert_eq!(builtin, KeywordConfig::default());
    assert!(builtin.high.contains(&"organoid".to_string()));

    // A config/keywords.toml in CWD takes over.
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/keywords.toml"),
        "high = [\"zebrafish\"]\nmedium = []\n",
    )
    .unwrap();
    let from_file = load_keywords_default().unwrap();
    assert_eq!(from_file.high, vec!["zebrafish".to_string()]);

    // Env var wins over everything.
    let p_json = tmp.path().join("override.json");
    fs::write(&p_json, r#"{"high": ["axolotl"], "medium": []}"#).unwrap();
    env::set_var(ENV_KEYWORDS_PATH, p_json.display().to_string());
    let from_env = load_keywords_default().unwrap();
    assert_eq!(from_env.high, vec!["axolotl".to_string()]);
    env::remove_var(ENV_KEYWORDS_PATH);

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_pointing_nowhere_is_an_error() {
    env::set_var(ENV_KEYWORDS_PATH, "/definitely/not/a/real/path.toml");
    assert!(load_keywords_default().is_err());
    env::remove_var(ENV_KEYWORDS_PATH);
}
