use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use super::job::ScheduledJob;

/// Фоновый воркер: запускает задачу по cron-расписанию.
///
/// Задача выполняется внутри цикла, поэтому следующий запуск
/// не начнется, пока не закончился предыдущий.
pub struct ScheduledJobWorker {
    job: Arc<dyn ScheduledJob>,
    schedule: Schedule,
    check_interval_seconds: u64,
}

impl ScheduledJobWorker {
    pub fn new(job: Arc<dyn ScheduledJob>, cron_expression: &str, check_interval_seconds: u64) -> Result<Self> {
        let schedule = Schedule::from_str(cron_expression)
            .with_context(|| format!("Invalid cron expression '{}'", cron_expression))?;
        Ok(Self {
            job,
            schedule,
            check_interval_seconds,
        })
    }

    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Запускает цикл выполнения задачи.
    pub async fn run_loop(&self) {
        info!(
            "Scheduled job '{}' started, next run at {:?}",
            self.job.name(),
            self.next_run_after(Utc::now())
        );
        let mut interval = time::interval(time::Duration::from_secs(self.check_interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last_check = Utc::now();
        loop {
            interval.tick().await;
            let now = Utc::now();
            if is_due(&self.schedule, last_check, now) {
                info!("Scheduled job '{}' is due. Running...", self.job.name());
                match self.job.run().await {
                    Ok(()) => info!("Scheduled job '{}' completed", self.job.name()),
                    Err(e) => error!("Scheduled job '{}' failed: {:?}", self.job.name(), e),
                }
            }
            last_check = now;
        }
    }
}

/// Было ли плановое время запуска в полуинтервале (from, to]
pub fn is_due(schedule: &Schedule, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    schedule.after(&from).next().map_or(false, |next| next <= to)
}
