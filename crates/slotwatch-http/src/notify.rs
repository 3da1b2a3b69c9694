//! Notification dispatchers

use async_trait::async_trait;
use serde_json::{json, Value};
use slotwatch_core::{NotifierConfig, SlotSnapshotEntry};
use slotwatch_engine::{DispatchError, Dispatcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::SetupError;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
const ENV_FROM_NUMBER: &str = "TWILIO_FROM_NUMBER";
const ENV_TO_NUMBER: &str = "TWILIO_TO_NUMBER";

/// `New slot for <name>: YYYY-MM-DD HH:MM`
pub fn notification_text(target_name: &str, entry: &SlotSnapshotEntry) -> String {
    format!("New slot for {}: {}", target_name, entry.display_time())
}

/// Build the dispatcher selected by config, reading credentials from the process environment
pub fn build_dispatcher(
    notifier: &NotifierConfig,
    timeout: Duration,
) -> Result<Arc<dyn Dispatcher>, SetupError> {
    build_dispatcher_with(notifier, timeout, |var| std::env::var(var).ok())
}

pub fn build_dispatcher_with<F>(
    notifier: &NotifierConfig,
    timeout: Duration,
    lookup: F,
) -> Result<Arc<dyn Dispatcher>, SetupError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(match notifier {
        NotifierConfig::Log => Arc::new(LogDispatcher),
        NotifierConfig::Webhook { url } => Arc::new(WebhookDispatcher::new(url, timeout)?),
        NotifierConfig::Twilio { from, to } => {
            let required = |var: &'static str| {
                lookup(var)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(SetupError::MissingCredential(var))
            };
            let from = match from {
                Some(from) => from.clone(),
                None => required(ENV_FROM_NUMBER)?,
            };
            let to = match to {
                Some(to) => to.clone(),
                None => required(ENV_TO_NUMBER)?,
            };
            Arc::new(TwilioDispatcher::new(
                required(ENV_ACCOUNT_SID)?,
                required(ENV_AUTH_TOKEN)?,
                from,
                to,
                timeout,
            )?)
        }
    })
}

fn client(timeout: Duration) -> Result<reqwest::Client, SetupError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

async fn check_response(response: reqwest::Response) -> Result<(), DispatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(DispatchError::Rejected {
        status: status.as_u16(),
        body,
    })
}

fn send_error(err: reqwest::Error, timeout: Duration) -> DispatchError {
    if err.is_timeout() {
        DispatchError::Timeout(timeout)
    } else {
        DispatchError::Transport(err.to_string())
    }
}

/// Logs the notification text and reports success (dry run)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl Dispatcher for LogDispatcher {
    fn name(&self) -> &str {
        "log"
    }

    async fn dispatch(
        &self,
        target_name: &str,
        entry: &SlotSnapshotEntry,
    ) -> Result<(), DispatchError> {
        info!(
            target = %target_name,
            slot = %entry.slot_identity,
            "{}",
            notification_text(target_name, entry)
        );
        Ok(())
    }
}

/// POSTs one JSON document per new slot
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl WebhookDispatcher {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SetupError> {
        Ok(Self {
            client: client(timeout)?,
            url: url.to_string(),
            timeout,
        })
    }

    pub fn payload(target_name: &str, entry: &SlotSnapshotEntry) -> Value {
        json!({
            "target": target_name,
            "slot_identity": entry.slot_identity,
            "scheduled_at": entry.scheduled_at.to_rfc3339(),
            "sub_id": entry.sub_id,
            "text": notification_text(target_name, entry),
            "metadata": entry.raw_metadata,
        })
    }
}

#[async_trait]
impl Dispatcher for WebhookDispatcher {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn dispatch(
        &self,
        target_name: &str,
        entry: &SlotSnapshotEntry,
    ) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::payload(target_name, entry))
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;
        check_response(response).await
    }
}

/// Sends an SMS through the Twilio Messages API
pub struct TwilioDispatcher {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
    timeout: Duration,
}

impl TwilioDispatcher {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from: String,
        to: String,
        timeout: Duration,
    ) -> Result<Self, SetupError> {
        Ok(Self {
            client: client(timeout)?,
            account_sid,
            auth_token,
            from,
            to,
            timeout,
        })
    }

    pub fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", TWILIO_API_BASE, self.account_sid)
    }

    pub fn form(&self, text: String) -> [(&'static str, String); 3] {
        [
            ("To", self.to.clone()),
            ("From", self.from.clone()),
            ("Body", text),
        ]
    }
}

#[async_trait]
impl Dispatcher for TwilioDispatcher {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn dispatch(
        &self,
        target_name: &str,
        entry: &SlotSnapshotEntry,
    ) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&self.form(notification_text(target_name, entry)))
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;
        check_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotwatch_core::{MonitoredTarget, QueryDescriptor, RawSlot};
    use std::collections::HashMap;

    fn entry(start: &str) -> SlotSnapshotEntry {
        let target = MonitoredTarget {
            display_name: "John Smith".to_string(),
            query: QueryDescriptor::from_url(
                "John Smith",
                "https://www.doctolib.fr/availabilities.json?visit_motive_ids=1&agenda_ids=2&practice_ids=3",
            )
            .unwrap(),
        };
        SlotSnapshotEntry::from_raw(&target, &RawSlot::new(start).with_sub_id("42")).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_notification_text_uses_slot_offset() {
        let text = notification_text("John Smith", &entry("2025-06-10T10:00:00.000+02:00"));
        assert_eq!(text, "New slot for John Smith: 2025-06-10 10:00");
    }

    #[test]
    fn test_webhook_payload() {
        let e = entry("2025-06-10T10:00:00+02:00");
        let payload = WebhookDispatcher::payload("John Smith", &e);
        assert_eq!(payload["target"], "John Smith");
        assert_eq!(payload["slot_identity"], e.slot_identity.as_str());
        assert_eq!(payload["scheduled_at"], "2025-06-10T10:00:00+02:00");
        assert_eq!(payload["sub_id"], "42");
        assert_eq!(payload["text"], "New slot for John Smith: 2025-06-10 10:00");
    }

    #[test]
    fn test_twilio_request_shape() {
        let twilio = TwilioDispatcher::new(
            "AC123".to_string(),
            "secret".to_string(),
            "+15550001".to_string(),
            "+15550002".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            twilio.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
        let form = twilio.form("hello".to_string());
        assert_eq!(form[0], ("To", "+15550002".to_string()));
        assert_eq!(form[1], ("From", "+15550001".to_string()));
        assert_eq!(form[2], ("Body", "hello".to_string()));
    }

    #[test]
    fn test_build_log_and_webhook() {
        let log = build_dispatcher_with(&NotifierConfig::Log, Duration::from_secs(5), env(&[]))
            .unwrap();
        assert_eq!(log.name(), "log");

        let webhook = build_dispatcher_with(
            &NotifierConfig::Webhook {
                url: "https://hooks.example.test/slots".to_string(),
            },
            Duration::from_secs(5),
            env(&[]),
        )
        .unwrap();
        assert_eq!(webhook.name(), "webhook");
    }

    #[test]
    fn test_build_twilio_requires_credentials() {
        let notifier = NotifierConfig::Twilio {
            from: Some("+15550001".to_string()),
            to: None,
        };
        let err = build_dispatcher_with(
            &notifier,
            Duration::from_secs(5),
            env(&[("TWILIO_ACCOUNT_SID", "AC123"), ("TWILIO_AUTH_TOKEN", "secret")]),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SetupError::MissingCredential("TWILIO_TO_NUMBER")));

        let twilio = build_dispatcher_with(
            &notifier,
            Duration::from_secs(5),
            env(&[
                ("TWILIO_ACCOUNT_SID", "AC123"),
                ("TWILIO_AUTH_TOKEN", "secret"),
                ("TWILIO_TO_NUMBER", "+15550002"),
            ]),
        )
        .unwrap();
        assert_eq!(twilio.name(), "twilio");
    }

    #[tokio::test]
    async fn test_log_dispatch_succeeds() {
        let e = entry("2025-06-10T10:00:00Z");
        assert!(LogDispatcher.dispatch("John Smith", &e).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_transport_error() {
        // Port 9 (discard) is closed on test hosts
        let webhook = WebhookDispatcher::new("http://127.0.0.1:9/hook", Duration::from_secs(5))
            .unwrap();
        let e = entry("2025-06-10T10:00:00Z");
        let err = webhook.dispatch("John Smith", &e).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Transport(_) | DispatchError::Timeout(_)
        ));
    }
}
