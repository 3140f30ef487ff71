use super::{parse, Cli, CliCommand};
use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

#[test]
fn scan_log_path() {
    match parse(&["mtr", "scan-log", "/tmp/perf-log.json"]) {
        CliCommand::ScanLog { path } => assert_eq!(path, PathBuf::from("/tmp/perf-log.json")),
        other => panic!("expected ScanLog, got {:?}", other),
    }
}

#[test]
fn purge_cache_no_args() {
    assert!(matches!(
        parse(&["mtr", "purge-cache"]),
        CliCommand::PurgeCache
    ));
}

#[test]
fn serve_default_and_custom_socket() {
    match parse(&["mtr", "serve"]) {
        CliCommand::Serve { socket } => assert!(socket.is_none()),
        other => panic!("expected Serve, got {:?}", other),
    }
    match parse(&["mtr", "serve", "--socket", "/run/user/1000/mtr.sock"]) {
        CliCommand::Serve { socket } => {
            assert_eq!(socket, Some(PathBuf::from("/run/user/1000/mtr.sock")))
        }
        other => panic!("expected Serve, got {:?}", other),
    }
}

#[test]
fn completions_shell() {
    match parse(&["mtr", "completions", "zsh"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Zsh),
        other => panic!("expected Completions, got {:?}", other),
    }
    assert!(Cli::try_parse_from(["mtr", "completions", "tcsh"]).is_err());
}

#[test]
fn unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["mtr", "add", "https://example.com"]).is_err());
}
