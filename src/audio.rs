use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::debug;

/// Downloads session recordings from object storage.
pub struct AudioFetcher {
    http: reqwest::Client,
}

impl AudioFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetches the recording and returns it base64-encoded for inline
    /// transmission to the model. Non-2xx responses and transport failures
    /// are both fatal for the request.
    pub async fn fetch_base64(&self, audio_url: &str) -> Result<String> {
        let response = self
            .http
            .get(audio_url)
            .send()
            .await
            .map_err(|e| Error::audio_fetch(format!("Failed to fetch audio file: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::audio_fetch(format!(
                "Failed to fetch audio file: status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::audio_fetch(format!("Failed to read audio body: {e}")))?;

        debug!("Fetched {} bytes of audio", bytes.len());

        Ok(STANDARD.encode(&bytes))
    }
}
