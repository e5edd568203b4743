//! Email Gateway Implementations
//!
//! HTTP-API gateway for production, a recording gateway for tests, and
//! the background dispatcher used by the fire-and-forget flows.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::domain::repository::EmailGateway;
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

/// Which lifecycle email is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Confirmation,
    Recovery,
}

// ============================================================================
// HTTP gateway
// ============================================================================

#[derive(Serialize)]
struct SendMailRequest<'a> {
    to: &'a str,
    subject: &'a str,
    html: String,
}

/// Gateway posting to a transactional-mail HTTP API
#[derive(Clone)]
pub struct HttpEmailGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpEmailGateway {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    async fn send(&self, to: &Email, subject: &str, html: String) -> AuthResult<()> {
        let request = SendMailRequest {
            to: to.as_str(),
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::EmailDispatch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::EmailDispatch(format!(
                "mail API returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

impl EmailGateway for HttpEmailGateway {
    async fn send_confirmation(&self, email: &Email, code: &str) -> AuthResult<()> {
        let html = format!(
            "<h1>Thank you for your registration</h1>\
             <p>To finish registration please follow the link below:\
             <a href=\"https://somesite.com/confirm-email?code={code}\">complete registration</a></p>"
        );
        self.send(email, "Registration confirmation", html).await
    }

    async fn send_recovery(&self, email: &Email, code: &str) -> AuthResult<()> {
        let html = format!(
            "<h1>Password recovery</h1>\
             <p>To finish password recovery please follow the link below:\
             <a href=\"https://somesite.com/password-recovery?recoveryCode={code}\">recovery password</a></p>"
        );
        self.send(email, "Password recovery", html).await
    }
}

// ============================================================================
// Recording gateway (tests / dev)
// ============================================================================

/// A sent email captured by [`RecordingEmailGateway`]
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub code: String,
    pub kind: EmailKind,
}

/// Gateway that records sends instead of delivering them
#[derive(Clone, Default)]
pub struct RecordingEmailGateway {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail_sends: Arc<Mutex<bool>>,
}

impl RecordingEmailGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (to exercise error paths)
    pub fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().expect("gateway lock poisoned") = fail;
    }

    /// All captured sends, in order
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().expect("gateway lock poisoned").clone()
    }

    fn record(&self, email: &Email, code: &str, kind: EmailKind) -> AuthResult<()> {
        if *self.fail_sends.lock().expect("gateway lock poisoned") {
            return Err(AuthError::EmailDispatch("simulated failure".to_string()));
        }

        self.sent.lock().expect("gateway lock poisoned").push(SentEmail {
            to: email.as_str().to_string(),
            code: code.to_string(),
            kind,
        });
        Ok(())
    }
}

impl EmailGateway for RecordingEmailGateway {
    async fn send_confirmation(&self, email: &Email, code: &str) -> AuthResult<()> {
        self.record(email, code, EmailKind::Confirmation)
    }

    async fn send_recovery(&self, email: &Email, code: &str) -> AuthResult<()> {
        self.record(email, code, EmailKind::Recovery)
    }
}

// ============================================================================
// Background dispatch
// ============================================================================

const MAX_SEND_ATTEMPTS: u32 = 3;

/// Dispatch a lifecycle email without blocking the request.
///
/// Retries a few times with a short backoff; terminal failures go to the
/// log sink and are never surfaced to the caller.
pub fn dispatch_in_background<G>(gateway: Arc<G>, email: Email, code: String, kind: EmailKind)
where
    G: EmailGateway + Send + Sync + 'static,
{
    tokio::spawn(async move {
        for attempt in 1..=MAX_SEND_ATTEMPTS {
            let result = match kind {
                EmailKind::Confirmation => gateway.send_confirmation(&email, &code).await,
                EmailKind::Recovery => gateway.send_recovery(&email, &code).await,
            };

            match result {
                Ok(()) => return,
                Err(e) if attempt < MAX_SEND_ATTEMPTS => {
                    tracing::warn!(
                        email = %email,
                        attempt,
                        error = %e,
                        "Email send failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                }
                Err(e) => {
                    tracing::error!(
                        email = %email,
                        error = %e,
                        "Email send failed, giving up"
                    );
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_gateway_captures_sends() {
        let gateway = RecordingEmailGateway::new();
        let email = Email::new("a@x.com").unwrap();

        gateway.send_confirmation(&email, "code-1").await.unwrap();
        gateway.send_recovery(&email, "code-2").await.unwrap();

        let sent = gateway.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, EmailKind::Confirmation);
        assert_eq!(sent[0].code, "code-1");
        assert_eq!(sent[1].kind, EmailKind::Recovery);
    }

    #[tokio::test]
    async fn test_recording_gateway_simulated_failure() {
        let gateway = RecordingEmailGateway::new();
        gateway.fail_sends(true);

        let email = Email::new("a@x.com").unwrap();
        let result = gateway.send_confirmation(&email, "code").await;
        assert!(matches!(result, Err(AuthError::EmailDispatch(_))));
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_background_dispatch_eventually_sends() {
        let gateway = Arc::new(RecordingEmailGateway::new());
        let email = Email::new("a@x.com").unwrap();

        dispatch_in_background(
            gateway.clone(),
            email,
            "code-bg".to_string(),
            EmailKind::Confirmation,
        );

        // Poll briefly; the spawned task has no completion handle
        for _ in 0..50 {
            if !gateway.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].code, "code-bg");
    }
}
