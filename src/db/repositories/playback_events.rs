use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value, Row, Transaction};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_optional_datetime},
    models::{ContentKey, EventFilter, PlaybackEvent},
};

const ENABLE_LOGS: bool = true;

use crate::log_info;

const SELECT_COLUMNS: &str = "SELECT id, session_key, user_id, username, media_type, title,
        parent_title, grandparent_title, started_at, stopped_at, play_duration,
        percent_complete, ip_address, transcode_decision
 FROM playback_events";

fn row_to_event(row: &Row) -> Result<PlaybackEvent> {
    let title: String = row.get("title")?;
    let parent_title: String = row.get("parent_title")?;
    let grandparent_title: String = row.get("grandparent_title")?;
    let started_at: String = row.get("started_at")?;
    let stopped_at: Option<String> = row.get("stopped_at")?;

    Ok(PlaybackEvent {
        id: row.get("id")?,
        session_key: row.get("session_key")?,
        user_id: row.get("user_id")?,
        username: row.get("username")?,
        media_type: row.get("media_type")?,
        content: ContentKey::new(title, Some(&parent_title), Some(&grandparent_title)),
        started_at: parse_datetime(&started_at, "started_at")?,
        stopped_at: parse_optional_datetime(stopped_at, "stopped_at")?,
        play_duration_secs: row.get("play_duration")?,
        percent_complete: row.get("percent_complete")?,
        ip_address: row.get("ip_address")?,
        transcode_decision: row.get("transcode_decision")?,
    })
}

fn insert_row(tx: &Transaction<'_>, event: &PlaybackEvent, created_at: &str) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO playback_events (
            id,
            session_key,
            user_id,
            username,
            media_type,
            title,
            parent_title,
            grandparent_title,
            started_at,
            stopped_at,
            play_duration,
            percent_complete,
            ip_address,
            transcode_decision,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            event.id,
            event.session_key,
            event.user_id,
            event.username,
            event.media_type,
            event.content.title,
            event.content.parent_title,
            event.content.grandparent_title,
            format_datetime(&event.started_at),
            event.stopped_at.as_ref().map(format_datetime),
            event.play_duration_secs,
            event.percent_complete,
            event.ip_address,
            event.transcode_decision,
            created_at,
        ],
    )
    .with_context(|| format!("failed to insert playback event {}", event.id))?;
    Ok(())
}

/// Translate a filter into a WHERE clause with positional parameters.
fn filter_clause(filter: &EventFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(start) = filter.start_date {
        conditions.push("started_at >= ?".to_string());
        values.push(Value::Text(format_datetime(&start)));
    }
    if let Some(end) = filter.end_date {
        conditions.push("started_at <= ?".to_string());
        values.push(Value::Text(format_datetime(&end)));
    }
    for (column, wanted) in [("username", &filter.users), ("media_type", &filter.media_types)] {
        if wanted.is_empty() {
            continue;
        }
        let placeholders = vec!["?"; wanted.len()].join(", ");
        conditions.push(format!("{column} IN ({placeholders})"));
        values.extend(wanted.iter().cloned().map(Value::Text));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

impl Database {
    pub async fn insert_event(&self, event: &PlaybackEvent) -> Result<()> {
        self.insert_events(std::slice::from_ref(event)).await.map(|_| ())
    }

    /// Insert a batch in one transaction; an existing id is overwritten.
    pub async fn insert_events(&self, events: &[PlaybackEvent]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let records = events.to_vec();
        let inserted = self
            .execute(move |conn| {
                let created_at = format_datetime(&Utc::now());
                let tx = conn.transaction()?;
                for event in &records {
                    insert_row(&tx, event, &created_at)?;
                }
                tx.commit().context("failed to commit playback events")?;
                Ok(records.len())
            })
            .await?;

        self.bump_version();
        log_info!("stored {} playback events", inserted);
        Ok(inserted)
    }

    /// Events matching `filter`, ascending by start time then id.
    pub async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<PlaybackEvent>> {
        let (clause, values) = filter_clause(filter);
        self.execute(move |conn| {
            let sql = format!("{SELECT_COLUMNS}{clause} ORDER BY started_at ASC, id ASC");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(values))?;

            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                events.push(row_to_event(row)?);
            }
            Ok(events)
        })
        .await
    }

    pub async fn count_events(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM playback_events", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}
