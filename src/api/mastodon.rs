//! Mastodon statuses client, the production [`Poster`].

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
    multipart,
};
use serde::Deserialize;

use crate::{api::publisher::Poster, prelude::*};

pub struct Api {
    client: Client,
    base_url: String,
}

impl Api {
    pub fn try_new(base_url: &str, access_token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }
}

#[derive(Deserialize)]
struct MediaResponse {
    id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
}

#[async_trait]
impl Poster for Api {
    #[instrument(skip_all, fields(path = %path.display()))]
    async fn upload_media(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image.png".to_owned(), |name| name.to_string_lossy().into_owned());
        let part = multipart::Part::bytes(bytes).file_name(file_name).mime_str("image/png")?;
        let response: MediaResponse = self
            .client
            .post(format!("{}/api/v2/media", self.base_url))
            .multipart(multipart::Form::new().part("file", part))
            .send()
            .await
            .context("failed to upload the media")?
            .error_for_status()
            .context("media upload failed")?
            .json()
            .await
            .context("failed to deserialize the media response")?;
        Ok(response.id)
    }

    #[instrument(skip_all, fields(n_media = media_ids.len()))]
    async fn post_status(
        &self,
        text: &str,
        media_ids: &[String],
        in_reply_to: Option<&str>,
    ) -> Result<String> {
        let mut form: Vec<(&str, String)> = vec![("status", text.to_owned())];
        for id in media_ids {
            form.push(("media_ids[]", id.clone()));
        }
        if let Some(id) = in_reply_to {
            form.push(("in_reply_to_id", id.to_owned()));
        }
        let response: StatusResponse = self
            .client
            .post(format!("{}/api/v1/statuses", self.base_url))
            .form(&form)
            .send()
            .await
            .context("failed to post the status")?
            .error_for_status()
            .context("posting the status failed")?
            .json()
            .await
            .context("failed to deserialize the status response")?;
        Ok(response.id)
    }
}
