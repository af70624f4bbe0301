use std::path::PathBuf;
use std::time::Duration;

use inkframe::config::{load_config_flags, parse_flag_tokens, ConfigFlags, DEFAULT_DEBOUNCE};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".inkframerc");
    let content = r#"
# comment
--watch

--service-url https://mermaid.ink/svg/
   
--log-file=render.log
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.watch);
    assert_eq!(flags.service_url.as_deref(), Some("https://mermaid.ink/svg/"));
    assert_eq!(flags.log_file, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".inkframerc");
    let content = "--watch\n--service-url http://file.example/svg/\n--timeout-secs 20\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "inkframe".to_string(),
        "--service-url".to_string(),
        "http://cli.example/svg/".to_string(),
        "--embed".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.embed, "cli flags should be applied");
    assert_eq!(
        effective.service_url.as_deref(),
        Some("http://cli.example/svg/"),
        "cli should override the service URL"
    );
    assert_eq!(
        effective.timeout(),
        Some(Duration::from_secs(20)),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_missing_config_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
    assert_eq!(flags.debounce(), DEFAULT_DEBOUNCE);
}
