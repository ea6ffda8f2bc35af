//! Unit tests for CLI commands

use crate::cli::{run_cli, Cli, Commands};
use clap::Parser;
use std::io::Write;

fn run(args: &[&str]) -> (bool, String) {
    let cli = Cli::try_parse_from(std::iter::once("vortex").chain(args.iter().copied())).unwrap();
    let mut out = Vec::new();
    let ok = run_cli(cli, &mut out).unwrap();
    (ok, String::from_utf8(out).unwrap())
}

fn config_file(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_dispatch_command_parses_flags() {
    let cli = Cli::try_parse_from([
        "vortex",
        "dispatch",
        "--config",
        "gw.yaml",
        "/router/rest/users",
        "-q",
        "method=list",
        "-X",
        "POST",
        "-H",
        "X-Access-Token: t",
        "-b",
        "{}",
    ])
    .unwrap();

    match cli.command {
        Commands::Dispatch {
            config,
            path,
            query,
            method,
            headers,
            body,
            content_type,
        } => {
            assert_eq!(config.to_string_lossy(), "gw.yaml");
            assert_eq!(path, "/router/rest/users");
            assert_eq!(query.as_deref(), Some("method=list"));
            assert_eq!(method, http::Method::POST);
            assert_eq!(headers, vec!["X-Access-Token: t"]);
            assert_eq!(body.as_deref(), Some("{}"));
            assert_eq!(content_type, "application/json");
        }
        _ => panic!("Expected Dispatch command"),
    }
}

#[test]
fn test_classify_command() {
    let (ok, out) = run(&["classify", "/router/rest/user/profile"]);
    assert!(ok);
    assert_eq!(out.trim(), "family=Rest router=http remainder=/user/profile");

    let (ok, out) = run(&["classify", "/health"]);
    assert!(!ok);
    assert!(out.starts_with("family=Unknown router=unknown"));
}

#[test]
fn test_mode_command() {
    assert_eq!(run(&["mode", "3"]), (true, "mcp\n".to_string()));
    assert_eq!(run(&["mode", "42"]), (false, "no mapping\n".to_string()));
    assert_eq!(run(&["mode", "-1"]), (false, "no mapping\n".to_string()));
}

#[test]
fn test_check_config_command() {
    let file = config_file("features: [beta]\nassets:\n  rest:\n    host: users.internal\n");
    let (ok, out) = run(&["check-config", file.path().to_str().unwrap()]);
    assert!(ok);
    assert!(out.contains(": ok"));
    assert!(out.contains("http -> http://users.internal"));
    assert!(out.contains("features: beta"));
}

#[test]
fn test_check_config_rejects_invalid_file() {
    let file = config_file("assets:\n  smtp:\n    host: mail\n");
    let cli = Cli::try_parse_from(["vortex", "check-config", file.path().to_str().unwrap()]).unwrap();
    let err = run_cli(cli, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("unknown protocol family 'smtp'"));
}

#[test]
fn test_dispatch_without_executor_reports_501() {
    let file = config_file("required_params: []\n");
    let (ok, out) = run(&[
        "dispatch",
        "--config",
        file.path().to_str().unwrap(),
        "/router/cst/anything",
    ]);
    assert!(!ok);
    assert!(out.starts_with("status: 501\ncontent-type: application/json\n"));
    assert!(out.contains("NOT_CONFIGURED"));
}

#[test]
fn test_dispatch_publishes_to_mq() {
    let file = config_file("assets:\n  mq:\n    scheme: amqp\n    host: broker\n");
    let (ok, out) = run(&[
        "dispatch",
        "--config",
        file.path().to_str().unwrap(),
        "/router/mq?method=orders.created",
        "-X",
        "POST",
        "-b",
        r#"{"id":7}"#,
    ]);
    assert!(ok, "{out}");
    assert!(out.starts_with("status: 200\n"));
    assert!(out.contains("published: topic=orders.created broker=broker bytes=8"));
}
