//! Postgres-backed notification dispatcher with best-effort email relay

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use sqlx::PgPool;
use uuid::Uuid;

use super::{NotificationDispatcher, NotificationMessage};

/// Persists each notification and hands it to the email relay if one is
/// configured. The relay call never fails the dispatch: the in-app row is
/// the source of truth, email is a bonus channel.
pub struct PgNotificationDispatcher {
    db_pool: PgPool,
    client: Client,
    email_relay_url: Option<String>,
}

impl PgNotificationDispatcher {
    pub fn new(db_pool: PgPool, email_relay_url: Option<String>) -> Self {
        Self {
            db_pool,
            client: Client::new(),
            email_relay_url,
        }
    }

    async fn relay_email(&self, user_id: Uuid, message: &NotificationMessage) {
        let Some(url) = &self.email_relay_url else {
            return;
        };

        let body = serde_json::json!({
            "user_id": user_id,
            "kind": message.kind.as_str(),
            "subject": message.title,
            "body": message.message,
        });

        match self.client.post(url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(
                    user_id = %user_id,
                    status = %response.status(),
                    "Email relay rejected notification"
                );
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Email relay unreachable");
            }
        }
    }
}

#[async_trait]
impl NotificationDispatcher for PgNotificationDispatcher {
    async fn notify(&self, user_id: Uuid, message: NotificationMessage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, payload, priority, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(message.kind.as_str())
        .bind(&message.title)
        .bind(&message.message)
        .bind(&message.payload)
        .bind(message.priority.as_str())
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await
        .context("Failed to insert notification")?;

        self.relay_email(user_id, &message).await;

        Ok(())
    }
}
