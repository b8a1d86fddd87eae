use erg_link::args::TopLevelCmd;
use erg_link::errors::AppError;

use tokio_util::sync::CancellationToken;

use ntest::timeout;

#[tokio::test]
#[timeout(3000)] // 3s timeout
async fn misspelled_bool() {
    let parent_token = CancellationToken::new();

    let arg_config = TopLevelCmd {
        config_override: Some("tests/test_configs/misspelled_bool.toml".into()),
        config_required: true,
        no_save: true,
        subcommands: None,
    };

    let result = erg_link::run_headless(arg_config, parent_token).await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
#[timeout(3000)] // 3s timeout
async fn missing_end_quote() {
    let parent_token = CancellationToken::new();

    let arg_config = TopLevelCmd {
        config_override: Some("tests/test_configs/missing_end_quote.toml".into()),
        config_required: true,
        no_save: true,
        subcommands: None,
    };

    let result = erg_link::run_headless(arg_config, parent_token).await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
#[timeout(3000)] // 3s timeout
async fn unparseable_sample_rate() {
    let parent_token = CancellationToken::new();

    let arg_config = TopLevelCmd {
        config_override: Some("tests/test_configs/bad_sample_rate.toml".into()),
        config_required: true,
        no_save: true,
        subcommands: None,
    };

    let result = erg_link::run_headless(arg_config, parent_token).await;
    assert!(matches!(result, Err(AppError::SampleRate(rate)) if rate == "2s"));
}
