use super::interceptor::{authorize, SessionProvider};
use super::types::{
    Acknowledgement, AuthResponse, ChatReply, ChatRequest, ClearSourceRequest, LoginRequest,
    PdfDocument, PdfLoaded, SignupRequest, SourceScope, SourceStatus, SpeechSynthesis,
    TextToSpeechRequest, Transcription, WebsiteLoaded, WebsiteRequest,
};
use super::{AuthApi, ChatApi, Operation, SpeechApi};
use crate::config::ApiConfig;
use crate::recording::AudioBlob;
use crate::{ChatError, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// reqwest-backed implementation of every backend operation
pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl HttpGateway {
    pub fn new(config: &ApiConfig, session: Arc<dyn SessionProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ChatError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            session,
        })
    }

    fn get(&self, op: Operation) -> RequestBuilder {
        self.client.get(format!("{}{}", self.base_url, op.path()))
    }

    fn post(&self, op: Operation) -> RequestBuilder {
        self.client.post(format!("{}{}", self.base_url, op.path()))
    }

    /// Authorize, send once, and classify the response
    async fn execute<T: DeserializeOwned>(&self, op: Operation, builder: RequestBuilder) -> Result<T> {
        let request = builder.build().map_err(|e| {
            ChatError::TransportFailure(format!("{}: {}", op.fallback_reason(), e))
        })?;
        let request = authorize(request, self.session.token().as_deref());
        debug!("{} {}", request.method(), request.url().path());

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| transport_failure(op, &e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ChatError::TransportFailure(format!("invalid response: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body).unwrap_or_else(|| op.fallback_reason().to_string());

        if status == StatusCode::UNAUTHORIZED {
            warn!("{} returned 401, invalidating session", op.path());
            self.session.invalidate();
            return Err(ChatError::AuthExpired(detail));
        }

        warn!("{} failed with status {}: {}", op.path(), status, detail);
        Err(ChatError::ServerError {
            status: status.as_u16(),
            detail,
        })
    }
}

fn transport_failure(op: Operation, e: &reqwest::Error) -> ChatError {
    if e.is_timeout() {
        warn!("{} timed out", op.path());
        ChatError::TransportFailure("timeout".to_string())
    } else {
        warn!("{} transport error: {}", op.path(), e);
        ChatError::TransportFailure(op.fallback_reason().to_string())
    }
}

/// Pull a readable reason out of an error body.
///
/// The backend reports `{"detail": "..."}`; request validation errors carry a
/// list of `{"msg": "..."}` objects instead.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

impl AuthApi for HttpGateway {
    fn login<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<AuthResponse>> {
        async move {
            let request = self
                .post(Operation::Login)
                .json(&LoginRequest { email, password });
            self.execute(Operation::Login, request).await
        }
        .boxed()
    }

    fn signup<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthResponse>> {
        async move {
            let request = self.post(Operation::Signup).json(&SignupRequest {
                name,
                email,
                password,
            });
            self.execute(Operation::Signup, request).await
        }
        .boxed()
    }

    fn logout(&self) -> BoxFuture<'_, Result<Acknowledgement>> {
        async move {
            let request = self.post(Operation::Logout);
            self.execute(Operation::Logout, request).await
        }
        .boxed()
    }
}

impl ChatApi for HttpGateway {
    fn send_message<'a>(
        &'a self,
        message: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<ChatReply>> {
        async move {
            let request = self
                .post(Operation::SendMessage)
                .json(&ChatRequest { message, session_id });
            self.execute(Operation::SendMessage, request).await
        }
        .boxed()
    }

    fn get_status(&self) -> BoxFuture<'_, Result<SourceStatus>> {
        async move {
            let request = self.get(Operation::Status);
            self.execute(Operation::Status, request).await
        }
        .boxed()
    }

    fn clear_source(&self, scope: SourceScope) -> BoxFuture<'_, Result<Acknowledgement>> {
        async move {
            let request = self
                .post(Operation::ClearSource)
                .json(&ClearSourceRequest { source_type: scope });
            self.execute(Operation::ClearSource, request).await
        }
        .boxed()
    }

    fn upload_pdf(&self, document: PdfDocument) -> BoxFuture<'_, Result<PdfLoaded>> {
        async move {
            let part = Part::bytes(document.bytes)
                .file_name(document.file_name)
                .mime_str("application/pdf")
                .map_err(|e| ChatError::InvalidInput(format!("Failed to build PDF part: {}", e)))?;

            let request = self
                .post(Operation::UploadPdf)
                .multipart(Form::new().part("pdf", part));
            self.execute(Operation::UploadPdf, request).await
        }
        .boxed()
    }

    fn load_website<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<WebsiteLoaded>> {
        async move {
            let request = self
                .post(Operation::LoadWebsite)
                .json(&WebsiteRequest { url });
            self.execute(Operation::LoadWebsite, request).await
        }
        .boxed()
    }
}

impl SpeechApi for HttpGateway {
    fn speech_to_text(&self, audio: AudioBlob) -> BoxFuture<'_, Result<Transcription>> {
        async move {
            debug!("Uploading {} bytes of {}", audio.len(), audio.mime_type);
            let part = Part::bytes(audio.bytes)
                .file_name(audio.file_name)
                .mime_str(&audio.mime_type)
                .map_err(|e| ChatError::InvalidInput(format!("Failed to build audio part: {}", e)))?;

            let request = self
                .post(Operation::SpeechToText)
                .multipart(Form::new().part("audio", part));
            self.execute(Operation::SpeechToText, request).await
        }
        .boxed()
    }

    fn text_to_speech<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<SpeechSynthesis>> {
        async move {
            let request = self
                .post(Operation::TextToSpeech)
                .json(&TextToSpeechRequest { text });
            self.execute(Operation::TextToSpeech, request).await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_string_detail() {
        assert_eq!(
            extract_detail(r#"{"detail":"Invalid email or password"}"#).as_deref(),
            Some("Invalid email or password")
        );
    }

    #[test]
    fn test_extract_validation_detail() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"field required"},
                                  {"loc":["body","password"],"msg":"field required"}]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("field required; field required")
        );
    }

    #[test]
    fn test_extract_missing_detail() {
        assert_eq!(extract_detail("<html>Bad Gateway</html>"), None);
        assert_eq!(extract_detail(r#"{"error":"nope"}"#), None);
        assert_eq!(extract_detail(r#"{"detail":"  "}"#), None);
    }
}
