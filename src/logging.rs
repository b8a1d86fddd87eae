use crate::errors::AppError;
use crate::monitor::registry::{MonitorUpdate, StateSubscription};
use crate::monitor::Field;
use crate::settings::MiscSettings;

use csv_async::AsyncSerializer;
use serde_derive::Serialize;
use std::path::PathBuf;
use tokio::fs::{create_dir, File};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const CSV_FILE_PREFIX: &str = "erg-";

#[allow(non_snake_case)]
#[derive(Debug, Serialize)]
struct CsvRow {
    Timestamp: String,
    Monitor: String,
    ElapsedTime: String,
    Distance: String,
    Pace: String,
    StrokeRate: u8,
    StrokeCount: u16,
    Power: u16,
    Calories: u16,
    HeartRate: String,
}

struct CsvLoggingActor {
    csv_folder: PathBuf,
    writer: Option<AsyncSerializer<File>>,
}

impl CsvLoggingActor {
    fn new(misc_settings: &MiscSettings) -> Self {
        Self {
            csv_folder: PathBuf::from(&misc_settings.log_sessions_csv_path),
            writer: None,
        }
    }

    async fn rx_loop(
        &mut self,
        subscription: &mut StateSubscription,
        cancel_token: CancellationToken,
    ) -> Result<(), AppError> {
        loop {
            tokio::select! {
                update = subscription.recv() => {
                    match update {
                        Ok(update) => self.handle_update(update).await?,
                        Err(RecvError::Closed) => {
                            info!("CSV Logging: Channel closed");
                            return Ok(());
                        }
                        Err(RecvError::Lagged(count)) => {
                            warn!("CSV Logging: Lagged! Missed {count} updates");
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    info!("CSV logging thread shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Writes a row whenever a monitor reports elapsed time moving.
    /// Rows carry the last known value of every column, so one line is a
    /// full snapshot no matter which record drove the update.
    async fn handle_update(&mut self, update: MonitorUpdate) -> Result<(), AppError> {
        if !update.changed.contains(Field::ElapsedTime) {
            return Ok(());
        }
        let workout = &update.state.workout;
        let Some(elapsed) = workout.elapsed_time else {
            return Ok(());
        };

        let row = CsvRow {
            Timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            Monitor: update.state.id.to_string(),
            ElapsedTime: elapsed.to_string(),
            Distance: workout
                .distance
                .map(|d| d.to_string())
                .unwrap_or_default(),
            Pace: workout
                .current_pace
                .map(|p| p.to_string())
                .unwrap_or_default(),
            StrokeRate: workout.stroke_rate.map(|r| r.0).unwrap_or(0),
            StrokeCount: workout.stroke_count.map(|c| c.strokes()).unwrap_or(0),
            Power: workout.average_power.map(|p| p.watts()).unwrap_or(0),
            Calories: workout.total_calories.map(|c| c.cals()).unwrap_or(0),
            HeartRate: workout
                .heart_rate
                .map(|h| h.to_string())
                .unwrap_or_default(),
        };

        if self.writer.is_none() {
            self.open_writer().await?;
        }
        if let Some(writer) = &mut self.writer {
            writer.serialize(row).await?;
            writer.flush().await?;
        }
        Ok(())
    }

    /// First row of the session creates the folder and file. Sessions that
    /// never produce a record leave nothing behind.
    async fn open_writer(&mut self) -> Result<(), AppError> {
        if !self.csv_folder.exists() {
            create_dir(&self.csv_folder)
                .await
                .map_err(|e| AppError::CreateDir {
                    path: self.csv_folder.clone(),
                    source: e,
                })?;
        }
        let csv_file_name = format!(
            "{}{}.csv",
            CSV_FILE_PREFIX,
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        );
        let csv_file_path = self.csv_folder.join(csv_file_name);
        info!("Logging session to {}", csv_file_path.display());
        self.writer = Some(AsyncSerializer::from_writer(
            File::create(&csv_file_path).await?,
        ));
        Ok(())
    }
}

pub async fn csv_logging_thread(
    mut subscription: StateSubscription,
    misc_settings: MiscSettings,
    cancel_token: CancellationToken,
) {
    if !misc_settings.log_sessions_to_csv {
        info!("CSV session logging wasn't enabled! Shutting down thread.");
        return;
    }

    let mut logging = CsvLoggingActor::new(&misc_settings);

    info!("Logging thread started!");

    if let Err(e) = logging.rx_loop(&mut subscription, cancel_token).await {
        error!("CSV Logging error: {e}");
    }
}
