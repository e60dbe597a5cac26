//! Tests for list and pull.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_list() {
    match parse(&["imgrepo", "list"]) {
        CliCommand::List { family, json } => {
            assert!(family.is_none());
            assert!(!json);
        }
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_list_family_json() {
    match parse(&["imgrepo", "list", "--family", "Ubuntu", "--json"]) {
        CliCommand::List { family, json } => {
            assert_eq!(family.as_deref(), Some("Ubuntu"));
            assert!(json);
        }
        _ => panic!("expected List with --family --json"),
    }
}

#[test]
fn cli_parse_pull() {
    match parse(&["imgrepo", "pull", "ubuntu-24.04"]) {
        CliCommand::Pull { id, no_verify } => {
            assert_eq!(id, "ubuntu-24.04");
            assert!(!no_verify);
        }
        _ => panic!("expected Pull"),
    }
}

#[test]
fn cli_parse_pull_no_verify_with_root() {
    let cli = Cli::try_parse_from([
        "imgrepo",
        "pull",
        "debian-12",
        "--no-verify",
        "--root",
        "/srv/images",
    ])
    .unwrap();
    assert_eq!(cli.root, Some(PathBuf::from("/srv/images")));
    match cli.command {
        CliCommand::Pull { id, no_verify } => {
            assert_eq!(id, "debian-12");
            assert!(no_verify);
        }
        _ => panic!("expected Pull with --no-verify"),
    }
}

#[test]
fn cli_parse_pull_requires_id() {
    assert!(Cli::try_parse_from(["imgrepo", "pull"]).is_err());
}
