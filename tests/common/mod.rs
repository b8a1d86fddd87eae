use erg_link::{run_headless, ArgConfig};
use tokio_util::sync::CancellationToken;

// The app gets its own runtime on a plain thread since #[tokio::test],
// even with the "multi_thread" flavor, starves the actor tasks.
#[allow(dead_code)]
pub fn headless_thread(
    arg_config: ArgConfig,
    parent_token: CancellationToken,
) -> Result<(), erg_link::errors::AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
        .block_on(async move {
            run_headless(arg_config, parent_token).await?;
            Ok(())
        })
}
