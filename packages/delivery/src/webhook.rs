//! Webhook notification.

use std::fmt;

use review_harvest_review_models::StandardizedReview;

use crate::DeliveryError;

/// Result of the webhook step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// No endpoint was configured.
    NotConfigured,
    /// The endpoint acknowledged with `200 OK`.
    Delivered,
    /// Delivery failed; the message says why.
    Failed(String),
}

impl fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => f.write_str("no webhook URL configured, data was not sent"),
            Self::Delivered => f.write_str("data sent to webhook"),
            Self::Failed(message) => write!(f, "webhook delivery failed: {message}"),
        }
    }
}

/// POSTs review collections to a fixed endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Creates a new notifier that posts to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Sends `reviews` as a JSON array body.
    ///
    /// Only `200 OK` counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Http`] on transport failure and
    /// [`DeliveryError::Status`] for any other status code.
    pub async fn notify(&self, reviews: &[StandardizedReview]) -> Result<(), DeliveryError> {
        log::info!("Sending {} reviews to webhook...", reviews.len());
        let resp = self.client.post(&self.url).json(reviews).send().await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        log::info!("Data successfully sent to webhook");
        Ok(())
    }

    /// Like [`Self::notify`], but logs and folds every failure into a
    /// [`WebhookOutcome`].
    pub async fn deliver(&self, reviews: &[StandardizedReview]) -> WebhookOutcome {
        match self.notify(reviews).await {
            Ok(()) => WebhookOutcome::Delivered,
            Err(e) => {
                log::error!("Error sending data to webhook: {e}");
                WebhookOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use review_harvest_review_models::ReviewSource;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Accepts one connection, answers with `status_line` and returns the
    /// request body it received.
    async fn one_shot_server(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];
            let body = loop {
                let read = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..read]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some((head, body)) = text.split_once("\r\n\r\n") {
                    let length = head
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if body.len() >= length {
                        break body.to_string();
                    }
                }
                assert!(read > 0, "connection closed before full request");
            };

            let reply = "rejected";
            let response = format!(
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            body
        });

        (url, handle)
    }

    fn reviews() -> Vec<StandardizedReview> {
        vec![StandardizedReview {
            customer_name: "Ayşe".to_string(),
            stay_date: "-".to_string(),
            review_text: "Olumlu: Temiz\nOlumsuz:".to_string(),
            rating: 8.5,
            source: ReviewSource::BookingCom,
            page: Some(1),
        }]
    }

    #[tokio::test]
    async fn posts_json_array_and_accepts_ok() {
        let (url, server) = one_shot_server("HTTP/1.1 200 OK").await;

        let outcome = WebhookNotifier::new(url).deliver(&reviews()).await;
        assert_eq!(outcome, WebhookOutcome::Delivered);

        let body = server.await.unwrap();
        let sent: Vec<StandardizedReview> = serde_json::from_str(&body).unwrap();
        assert_eq!(sent, reviews());
    }

    #[tokio::test]
    async fn non_ok_status_is_reported_with_body() {
        let (url, server) = one_shot_server("HTTP/1.1 201 Created").await;

        let err = WebhookNotifier::new(url)
            .notify(&reviews())
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            DeliveryError::Status { status, body } => {
                assert_eq!(status, 201);
                assert_eq!(body, "rejected");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_without_panicking() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        drop(listener);

        let outcome = WebhookNotifier::new(url).deliver(&reviews()).await;
        assert!(matches!(outcome, WebhookOutcome::Failed(_)));
    }
}
