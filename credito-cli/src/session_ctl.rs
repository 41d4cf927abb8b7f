//! Holds one analysis session and invokes extraction for it.
//!
//! `analyze` takes `&mut self`, so a second extraction cannot start on the
//! same session while one is pending.

use anyhow::Result;
use chrono::{DateTime, Local};
use credito_core::{MonthlyReport, Session};
use credito_extract::{DocumentService, ExtractionClient, MediaType, Sleeper};
use tracing::info;

pub struct SessionController<S, Z> {
    client: ExtractionClient<S, Z>,
    session: Session,
}

impl<S: DocumentService, Z: Sleeper> SessionController<S, Z> {
    pub fn new(client: ExtractionClient<S, Z>) -> Self {
        Self {
            client,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one extraction. On failure the previously held entries stay as they were.
    pub async fn analyze(&mut self, document: &[u8], media_type: MediaType) -> Result<&Session> {
        let result = self.client.extract(document, media_type).await?;
        info!(entries = result.entries.len(), "replacing session entries");
        self.session.replace(result);
        Ok(&self.session)
    }

    /// Build the report, preferring an explicitly confirmed display name
    pub fn report(&mut self, display_name: Option<&str>, now: DateTime<Local>) -> MonthlyReport {
        if let Some(name) = display_name {
            self.session.set_display_name(name);
        }
        self.session.report(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use credito_core::Entry;
    use credito_extract::{ExtractError, ExtractionRequest};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    const ANA: &str = r#"{"clientName":"ANA M SOUZA","entries":[{"description":"PIX","amount":10,"date":"2024-01-01"}]}"#;

    struct Scripted(Mutex<VecDeque<Result<String, ExtractError>>>);

    #[async_trait]
    impl DocumentService for Scripted {
        async fn generate(&self, _request: &ExtractionRequest) -> Result<String, ExtractError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExtractError::Unknown("script exhausted".into())))
        }
    }

    struct NoWait;

    #[async_trait]
    impl Sleeper for NoWait {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn controller(outcomes: Vec<Result<String, ExtractError>>) -> SessionController<Scripted, NoWait> {
        let service = Scripted(Mutex::new(outcomes.into()));
        SessionController::new(ExtractionClient::with_sleeper(service, NoWait))
    }

    #[tokio::test]
    async fn test_analyze_replaces_entries() {
        let mut ctl = controller(vec![
            Ok(ANA.into()),
            Ok(r#"{"clientName":"LUCAS","entries":[{"description":"TED","amount":80,"date":"2024-06-01"}]}"#.into()),
        ]);
        ctl.analyze(b"%PDF", MediaType::Pdf).await.unwrap();

        let session = ctl.analyze(b"img", MediaType::Image("png".into())).await.unwrap();
        assert_eq!(session.client_name, "LUCAS");
        assert_eq!(session.entries, vec![Entry::new("TED", 80.0, "2024-06-01")]);
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_previous_entries() {
        let mut ctl = controller(vec![Ok(ANA.into()), Err(ExtractError::SafetyBlocked("SAFETY".into()))]);
        ctl.analyze(b"%PDF", MediaType::Pdf).await.unwrap();

        let err = ctl.analyze(b"%PDF", MediaType::Pdf).await.unwrap_err();
        assert!(err.to_string().contains("content policy"));
        assert_eq!(ctl.session().entries.len(), 1);
        assert_eq!(ctl.session().client_name, "ANA M SOUZA");
    }

    #[tokio::test]
    async fn test_report_uses_confirmed_name() {
        let mut ctl = controller(vec![Ok(ANA.into())]);
        ctl.analyze(b"%PDF", MediaType::Pdf).await.unwrap();
        let now = Local.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();

        assert_eq!(ctl.report(None, now).display_name, "ANA M SOUZA");
        assert_eq!(ctl.report(Some("Ana Souza"), now).display_name, "Ana Souza");
        assert_eq!(ctl.session().client_name, "ANA M SOUZA");
        assert_eq!(ctl.report(None, now).aggregation.grand_total, 10.0);
    }
}
