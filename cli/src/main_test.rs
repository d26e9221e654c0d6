use serde_json::json;

use super::*;

#[test]
fn parse_value_accepts_json() {
    assert_eq!(parse_value("3"), json!(3));
    assert_eq!(parse_value("[1,2]"), json!([1, 2]));
    assert_eq!(parse_value("\"dark\""), json!("dark"));
}

#[test]
fn parse_value_falls_back_to_string() {
    assert_eq!(parse_value("dark"), json!("dark"));
    assert_eq!(parse_value("{oops"), json!("{oops"));
}

#[test]
fn cli_parses_user_and_subcommand() {
    let cli = Cli::try_parse_from(["vault", "--path", "/tmp/x.json", "--user", "alice", "set", "k", "1"]).unwrap();
    assert_eq!(cli.user.as_deref(), Some("alice"));
    assert!(matches!(cli.command, Command::Set { ref key, ref value } if key == "k" && value == "1"));
}

#[test]
fn partition_counts_lists_current_user_even_when_empty() {
    let path = std::env::temp_dir().join(format!("vault_cli_counts_{}.json", std::process::id()));
    let store = NamespacedStore::new(FileBackend::open(&path).unwrap(), StoreConfig::default(), Some("zoe"));
    store.set("global-x", 1).unwrap();

    assert_eq!(partition_counts(&store), json!({"global": 1, "user-zoe": 0}));
    std::fs::remove_file(&path).unwrap_or_default();
}
