use std::path::PathBuf;
use std::{thread::sleep, time::Duration};

use erg_link::args::TopLevelCmd;
use tokio_util::sync::CancellationToken;

use ntest::timeout;

use common::headless_thread;
mod common;

fn session_files(dir: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("erg-") && name.ends_with(".csv"))
        })
        .collect();
    files.sort();
    files
}

// ntest's #[timeout] runs the test body on a spawned thread, so the
// returned error must be Send (erg_link::AppResult's boxed error is not).
type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn data_rows(path: &PathBuf) -> TestResult<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    let mut lines = contents.lines();
    let header = lines.next().unwrap_or_default();
    assert!(
        header.starts_with("Timestamp,Monitor,ElapsedTime,Distance,Pace,StrokeRate"),
        "unexpected header: {header}"
    );
    Ok(lines.map(|line| line.to_owned()).collect())
}

/// "m:ss.c" into seconds.
fn parse_elapsed(column: &str) -> f64 {
    let (minutes, seconds) = column.split_once(':').expect("malformed elapsed column");
    minutes.parse::<f64>().unwrap() * 60.0 + seconds.parse::<f64>().unwrap()
}

#[tokio::test]
#[timeout(15000)] // 15s timeout
async fn dummy_rows_reach_csv() -> TestResult<()> {
    let output_dir = "tests/output";
    let _ = std::fs::remove_dir_all(output_dir);

    let parent_token = CancellationToken::new();

    let arg_config = TopLevelCmd {
        config_override: Some("tests/test_configs/dummy_session.toml".into()),
        config_required: true,
        no_save: true,
        subcommands: None,
    };

    let parent_clone = parent_token.clone();
    let app_thread = std::thread::spawn(move || headless_thread(arg_config, parent_clone));

    sleep(Duration::from_secs(3));

    let files = session_files(output_dir);
    assert_eq!(files.len(), 1, "expected exactly one session file");
    let rows = data_rows(&files[0])?;
    assert!(rows.len() >= 3, "only {} rows after 3s", rows.len());

    // The first row lands before the first rate record, skip it
    for row in rows.iter().skip(1) {
        let columns: Vec<&str> = row.split(',').collect();
        assert_eq!(columns[1], "sim-pm5");
        assert_eq!(columns[5], "30", "stroke rate column");
    }

    let first = rows.first().map(|r| r.split(',').nth(2).unwrap().to_owned());
    let last = rows.last().map(|r| r.split(',').nth(2).unwrap().to_owned());
    let (Some(first), Some(last)) = (first, last) else {
        panic!("rows vanished");
    };
    assert!(
        parse_elapsed(&last) > parse_elapsed(&first),
        "elapsed time never moved: {first} -> {last}"
    );

    // Simulated pull at 1:45/500m lands around 300W
    let last_row = rows.last().expect("rows vanished");
    let columns: Vec<&str> = last_row.split(',').collect();
    let watts: u16 = columns[7].parse()?;
    assert!((250..=350).contains(&watts), "implausible power: {watts}");
    assert!(columns[3].ends_with('m'), "distance column: {}", columns[3]);
    assert!(columns[4].ends_with("/500m"), "pace column: {}", columns[4]);

    sleep(Duration::from_secs(1));
    let more_rows = data_rows(&files[0])?;
    assert!(more_rows.len() > rows.len(), "rows stopped flowing");

    parent_token.cancel();
    let _ = app_thread.join();
    std::fs::remove_dir_all(output_dir)?;
    Ok(())
}

#[tokio::test]
#[timeout(20000)] // 20s timeout
async fn simulated_dropout_resumes() -> TestResult<()> {
    let output_dir = "tests/output_dropout";
    let _ = std::fs::remove_dir_all(output_dir);

    let parent_token = CancellationToken::new();

    let arg_config = TopLevelCmd {
        config_override: Some("tests/test_configs/dummy_dropout.toml".into()),
        config_required: true,
        no_save: true,
        subcommands: None,
    };

    let parent_clone = parent_token.clone();
    let app_thread = std::thread::spawn(move || headless_thread(arg_config, parent_clone));

    // At 30spm the link drops after stroke two (~4s in) and comes back
    // two seconds later
    sleep(Duration::from_secs(5));
    let files = session_files(output_dir);
    assert_eq!(files.len(), 1, "expected exactly one session file");
    let rows_before = data_rows(&files[0])?.len();
    assert!(rows_before >= 3, "only {rows_before} rows before the drop");

    sleep(Duration::from_secs(4));
    let rows_after = data_rows(&files[0])?.len();
    assert!(
        rows_after > rows_before + 2,
        "rows never resumed after reconnect: {rows_before} -> {rows_after}"
    );

    parent_token.cancel();
    let _ = app_thread.join();
    std::fs::remove_dir_all(output_dir)?;
    Ok(())
}
