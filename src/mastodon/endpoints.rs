// Mastodon API endpoint functions.
// Password login, media upload, and status publishing.

use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::error::Result;

use super::client::MastodonClient;
use super::types::{ClientCredentials, Media, MediaAttachment, Status, Token};

const SCOPES: &str = "read write";

impl MastodonClient {
    /// Log in with the OAuth password grant and keep the resulting token.
    pub async fn log_in(
        &mut self,
        credentials: &ClientCredentials,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let form = [
            ("grant_type", "password"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("username", username),
            ("password", password),
            ("scope", SCOPES),
        ];
        let response = self.post_form("/oauth/token", &form).await?;
        let token: Token = response.json().await?;
        self.set_access_token(token.access_token);
        Ok(())
    }

    /// Upload an image with its alt text.
    pub async fn upload_media(&mut self, media: &Media) -> Result<MediaAttachment> {
        let part = Part::bytes(media.buf.clone())
            .file_name("image.png")
            .mime_str(&media.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("description", media.description.clone());

        let response = self.post_multipart("/api/v2/media", form).await?;
        let attachment: MediaAttachment = response.json().await?;
        Ok(attachment)
    }

    /// Publish a status with already-uploaded media.
    pub async fn post_status(&mut self, text: &str, media_ids: &[String]) -> Result<Status> {
        let mut form = vec![("status", text), ("language", "en")];
        form.extend(media_ids.iter().map(|id| ("media_ids[]", id.as_str())));

        let response = self.post_form("/api/v1/statuses", &form).await?;
        let status: Status = response.json().await?;
        Ok(status)
    }

    /// Upload every attachment, then publish them together with `text`.
    pub async fn make_post(&mut self, text: &str, media: &[Media]) -> Result<Status> {
        let mut media_ids = Vec::with_capacity(media.len());
        for item in media {
            let attachment = self.upload_media(item).await?;
            media_ids.push(attachment.id);
        }

        let status = self.post_status(text, &media_ids).await?;
        info!(id = %status.id, url = ?status.url, "posted status");
        Ok(status)
    }
}
