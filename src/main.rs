use erg_link::{args::TopLevelCmd, run_bridge, AppResult};

#[tokio::main]
async fn main() -> AppResult<()> {
    let arg_config: TopLevelCmd = argh::from_env();
    run_bridge(arg_config).await
}
