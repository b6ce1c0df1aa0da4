//! Stats gateway: where finished match results are sent

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::store::{SessionStore, StoreError};

/// Gateway errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Stats service error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Body posted to the remote end-game endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndGameRequest<'a> {
    session_id: Uuid,
    winner_id: Option<Uuid>,
    game_stats: &'a serde_json::Value,
}

/// Remote session service reached over HTTP
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn end_game_url(&self, session_id: Uuid) -> String {
        format!("{}/api/sessions/{}/end", self.base_url, session_id)
    }

    pub async fn end_game(
        &self,
        session_id: Uuid,
        winner_id: Option<Uuid>,
        game_stats: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let body = EndGameRequest {
            session_id,
            winner_id,
            game_stats,
        };

        let response = self
            .client
            .post(self.end_game_url(session_id))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Destination for match results
#[derive(Clone)]
pub enum StatsGateway {
    /// Record into this process's session store
    Local(SessionStore),
    /// Forward to a remote session service
    Http(HttpGateway),
    /// Drop results
    Disabled,
}

impl StatsGateway {
    pub async fn report_match_end(
        &self,
        session_id: Uuid,
        winner_id: Option<Uuid>,
        game_stats: serde_json::Value,
    ) -> Result<(), GatewayError> {
        match self {
            StatsGateway::Local(store) => {
                store.end_game(session_id, winner_id, Some(game_stats))?;
                Ok(())
            }
            StatsGateway::Http(gateway) => gateway.end_game(session_id, winner_id, &game_stats).await,
            StatsGateway::Disabled => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PlayerStore, SessionStatus};

    #[tokio::test]
    async fn local_gateway_completes_session() {
        let store = SessionStore::new(PlayerStore::new(), 16);
        let host = store.create_session("Host").unwrap();
        let gateway = StatsGateway::Local(store.clone());

        gateway
            .report_match_end(host.session_id, Some(host.player_id), serde_json::json!({"kills": 3}))
            .await
            .unwrap();

        let session = store.get_session(host.session_id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.game_stats, Some(serde_json::json!({"kills": 3})));
    }

    #[tokio::test]
    async fn local_gateway_surfaces_store_errors() {
        let gateway = StatsGateway::Local(SessionStore::new(PlayerStore::new(), 16));
        let err = gateway
            .report_match_end(Uuid::new_v4(), None, serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Store(StoreError::SessionNotFound)));
    }

    #[test]
    fn http_gateway_builds_end_url() {
        let gateway = HttpGateway::new("https://stats.example.com/");
        let id = Uuid::nil();
        assert_eq!(
            gateway.end_game_url(id),
            format!("https://stats.example.com/api/sessions/{}/end", id)
        );
    }
}
