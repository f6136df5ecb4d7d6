use anyhow::Result;

use super::derive_ws_url;
use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());

    insta::assert_snapshot!(res, @r###"
    # Alter Ego API URL.
    api-url = "http://localhost:8000"

    # Chat streaming URL. Derived from the API URL when not set.
    # ws-url = ""

    # API access token.
    # token = ""

    # Language for labels and messages. Detected from LANG when not set. [possible values: ko, en]
    # locale = ""

    # Items to request per page.
    page-limit = 20

    # Time to wait in milliseconds before giving up on opening a chat connection.
    connect-timeout = 10000

    # Milliseconds between LoRA status checks when watching training.
    lora-poll-interval = 10000
    "###);
}

#[test]
fn it_names_env_vars_after_keys() {
    assert_eq!(ConfigKey::ApiUrl.env_var(), "ALTEREGO_API_URL");
    assert_eq!(
        ConfigKey::LoraPollInterval.env_var(),
        "ALTEREGO_LORA_POLL_INTERVAL"
    );
}

#[test]
fn it_derives_ws_urls() {
    assert_eq!(derive_ws_url("http://localhost:8000"), "ws://localhost:8000");
    assert_eq!(
        derive_ws_url("https://api.alterego.example/"),
        "wss://api.alterego.example"
    );
    assert_eq!(derive_ws_url("ws://already"), "ws://already");
}

// Config is process-wide, so loading is exercised in one sequential test.
#[tokio::test]
async fn it_loads_config_files() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["alterego", "personas", "-c", "./test/config.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(
        Config::get(ConfigKey::ApiUrl),
        "https://api.alterego.example/"
    );
    assert_eq!(Config::ws_url(), "wss://api.alterego.example");
    assert_eq!(Config::get(ConfigKey::Locale), "ko");
    assert_eq!(Config::get(ConfigKey::PageLimit), "5");
    assert_eq!(Config::get(ConfigKey::ConnectTimeout), "10000");

    let matches = cli::build().try_get_matches_from(vec![
        "alterego",
        "personas",
        "-c",
        "./test/config.toml",
        "--page-limit",
        "7",
        "--ws-url",
        "ws://127.0.0.1:9000/",
    ])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(Config::get(ConfigKey::PageLimit), "7");
    assert_eq!(Config::ws_url(), "ws://127.0.0.1:9000");

    let matches = cli::build().try_get_matches_from(vec![
        "alterego",
        "personas",
        "-c",
        "./test/bad-config.toml",
    ])?;
    let res = Config::load(cli::build(), vec![&matches]).await;

    assert!(res.is_err());
    assert!(res
        .unwrap_err()
        .to_string()
        .contains("Possible values are: ko, en"));

    return Ok(());
}
