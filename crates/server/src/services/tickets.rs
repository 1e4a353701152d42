//! Daily pickup ticket numbers (`A01` … `A99`, `B01` …).

use chrono::NaiveDate;
use sqlx::PgConnection;

use fastlanche_core::{TicketCode, TicketCounter};

use crate::db::RepositoryError;
use crate::db::system_info::{self, TICKET_COUNTER_KEY};

/// Issue the next ticket for `today`.
///
/// Must run inside the transaction that records the ticket: the counter row
/// stays locked until that transaction ends, so concurrent callers are
/// serialized and a rolled-back order gives its number back.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the stored counter is not a
/// valid counter document.
/// Returns `RepositoryError::Database` if a query fails.
pub async fn issue_ticket(
    conn: &mut PgConnection,
    today: NaiveDate,
) -> Result<TicketCode, RepositoryError> {
    let seed = to_json(&TicketCounter::fresh(today))?;
    let stored = system_info::lock(&mut *conn, TICKET_COUNTER_KEY, &seed).await?;

    let previous: TicketCounter = serde_json::from_value(stored).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid {TICKET_COUNTER_KEY}: {e}"))
    })?;

    let next = TicketCounter::advance(Some(previous), today);
    system_info::set(&mut *conn, TICKET_COUNTER_KEY, &to_json(&next)?).await?;

    tracing::debug!(ticket = %next.code(), %today, "Issued ticket");
    Ok(next.code())
}

fn to_json(counter: &TicketCounter) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(counter)
        .map_err(|e| RepositoryError::DataCorruption(format!("unserializable ticket counter: {e}")))
}
