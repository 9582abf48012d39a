//! Parse tests for the remaining subcommands.

use std::path::Path;

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_list() {
    assert!(matches!(parse(&["mdr", "list"]), CliCommand::List));
}

#[test]
fn cli_parse_set_grace_and_visibility() {
    match parse(&[
        "mdr",
        "set",
        "--grace-seconds",
        "5",
        "--show-check-page",
        "false",
    ]) {
        CliCommand::Set {
            grace_seconds,
            show_check_page,
        } => {
            assert_eq!(grace_seconds.as_deref(), Some("5"));
            assert_eq!(show_check_page, Some(false));
        }
        _ => panic!("expected Set"),
    }
}

#[test]
fn cli_parse_set_accepts_non_numeric_grace() {
    // Validation happens in the clamp, not in the parser.
    match parse(&["mdr", "set", "--grace-seconds", "soon"]) {
        CliCommand::Set { grace_seconds, .. } => {
            assert_eq!(grace_seconds.as_deref(), Some("soon"));
        }
        _ => panic!("expected Set"),
    }
}

#[test]
fn cli_parse_check() {
    match parse(&["mdr", "check", "https://a.example/page"]) {
        CliCommand::Check { url } => assert_eq!(url, "https://a.example/page"),
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_backup() {
    match parse(&["mdr", "backup", "a.example", "/tmp/data.json"]) {
        CliCommand::Backup { host, data } => {
            assert_eq!(host, "a.example");
            assert_eq!(data, Path::new("/tmp/data.json"));
        }
        _ => panic!("expected Backup"),
    }
}

#[test]
fn cli_parse_restore() {
    match parse(&["mdr", "restore", "a.example", "--on-next-load"]) {
        CliCommand::Restore { host, on_next_load } => {
            assert_eq!(host, "a.example");
            assert!(on_next_load);
        }
        _ => panic!("expected Restore"),
    }
}
