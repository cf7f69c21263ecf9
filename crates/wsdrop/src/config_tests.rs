// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::Config;

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn defaults() -> anyhow::Result<()> {
    let config = parse(&["wsdrop", "--auth-token", "t0k"]);
    config.validate()?;
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8000);
    assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    assert_eq!(config.max_message_bytes, 16 * 1024 * 1024);
    assert_eq!(config.idle_timeout(), Some(Duration::from_secs(30)));
    Ok(())
}

#[test]
fn zero_idle_timeout_disables_it() -> anyhow::Result<()> {
    let config = parse(&["wsdrop", "--auth-token", "t", "--idle-timeout-ms", "0"]);
    config.validate()?;
    assert_eq!(config.idle_timeout(), None);
    Ok(())
}

#[test]
fn missing_token_fails_to_parse() {
    // Guard against a token leaking in from the environment running the tests.
    if std::env::var_os("WSDROP_AUTH_TOKEN").is_some() {
        return;
    }
    assert!(Config::try_parse_from(["wsdrop"]).is_err());
}

#[yare::parameterized(
    empty_token     = { &["wsdrop", "--auth-token", ""], "must not be empty" },
    spaced_token    = { &["wsdrop", "--auth-token", "a b"], "whitespace" },
    tiny_messages   = { &["wsdrop", "--auth-token", "t", "--max-message-bytes", "11"],
                        "at least 12" },
    bad_log_format  = { &["wsdrop", "--auth-token", "t", "--log-format", "xml"],
                        "invalid log format" },
)]
fn invalid_config(args: &[&str], expected_substr: &str) {
    let config = parse(args);
    crate::assert_err_contains!(config.validate(), expected_substr);
}
