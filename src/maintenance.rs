use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::init_pool;
use crate::service::booking::BookingService;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy)]
pub struct CompleteBookingsResult {
    pub cutoff: DateTime<Utc>,
    pub bookings_completed: u64,
}

/// One-shot job: completes every approved booking whose end date has passed.
pub async fn complete_finished_bookings(config: &Config) -> Result<CompleteBookingsResult, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = PostgresRepository { pool: pool.clone() };
    let cutoff = Utc::now();
    let bookings_completed = BookingService::new(&repo)
        .complete_finished(cutoff)
        .await
        .map_err(|err| format!("Failed to complete bookings: {err:?}"))?;

    pool.close().await;

    Ok(CompleteBookingsResult { cutoff, bookings_completed })
}
