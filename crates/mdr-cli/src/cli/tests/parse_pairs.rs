//! Parse tests for the pair-editing subcommands.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_add() {
    match parse(&["mdr", "add", "a.example", "b.example"]) {
        CliCommand::Add {
            domain_a,
            domain_b,
            backup_local_storage,
        } => {
            assert_eq!(domain_a, "a.example");
            assert_eq!(domain_b, "b.example");
            assert!(!backup_local_storage);
        }
        _ => panic!("expected Add"),
    }
}

#[test]
fn cli_parse_add_with_backup_flag() {
    match parse(&[
        "mdr",
        "add",
        "a.example",
        "b.example",
        "--backup-local-storage",
    ]) {
        CliCommand::Add {
            backup_local_storage,
            ..
        } => assert!(backup_local_storage),
        _ => panic!("expected Add with --backup-local-storage"),
    }
}

#[test]
fn cli_parse_remove() {
    match parse(&["mdr", "remove", "a.example"]) {
        CliCommand::Remove { domain } => assert_eq!(domain, "a.example"),
        _ => panic!("expected Remove"),
    }
}
