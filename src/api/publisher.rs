//! The posting seam: the finished plan goes out through a [`Poster`],
//! one reply-chained status per post.

use std::path::Path;

use async_trait::async_trait;

use crate::{error::ReportError, partition::Post, prelude::*};

/// A minimal statuses-with-media client, injected so tests can record
/// calls instead of talking to an instance.
#[async_trait]
pub trait Poster {
    /// Uploads one image and returns its media id.
    async fn upload_media(&self, path: &Path) -> Result<String>;

    /// Creates one status and returns its id.
    async fn post_status(
        &self,
        text: &str,
        media_ids: &[String],
        in_reply_to: Option<&str>,
    ) -> Result<String>;
}

/// Publishes the posts in plan order, each one replying to the previous.
///
/// The partitioner already keeps every post under the cap; the check here
/// guards against a partitioner bug reaching the outside world.
pub async fn publish_thread(poster: &dyn Poster, posts: &[Post], media_cap: usize) -> Result {
    let mut in_reply_to: Option<String> = None;
    for (index, post) in posts.iter().enumerate() {
        if post.images.len() > media_cap {
            return Err(ReportError::PostMediaCapExceeded {
                index,
                count: post.images.len(),
                cap: media_cap,
            }
            .into());
        }
        let mut media_ids = Vec::with_capacity(post.images.len());
        for image in &post.images {
            media_ids.push(poster.upload_media(image).await?);
        }
        let id = poster.post_status(&post.caption, &media_ids, in_reply_to.as_deref()).await?;
        info!(status_id = %id, n_media = media_ids.len(), "Posted");
        in_reply_to = Some(id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Mutex};

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Upload(PathBuf),
        Status { text: String, media_ids: Vec<String>, in_reply_to: Option<String> },
    }

    #[derive(Default)]
    struct RecordingPoster(Mutex<Vec<Call>>);

    #[async_trait]
    impl Poster for RecordingPoster {
        async fn upload_media(&self, path: &Path) -> Result<String> {
            let mut calls = self.0.lock().unwrap();
            calls.push(Call::Upload(path.to_path_buf()));
            Ok(format!("media-{}", calls.len()))
        }

        async fn post_status(
            &self,
            text: &str,
            media_ids: &[String],
            in_reply_to: Option<&str>,
        ) -> Result<String> {
            let mut calls = self.0.lock().unwrap();
            calls.push(Call::Status {
                text: text.to_owned(),
                media_ids: media_ids.to_vec(),
                in_reply_to: in_reply_to.map(ToOwned::to_owned),
            });
            Ok(format!("status-{}", calls.len()))
        }
    }

    #[tokio::test]
    async fn test_publish_thread_chains_replies() -> Result {
        let poster = RecordingPoster::default();
        let posts = vec![
            Post { caption: "一通目".to_owned(), images: vec![PathBuf::from("img/00.png")] },
            Post { caption: "二通目".to_owned(), images: vec![] },
        ];
        publish_thread(&poster, &posts, 4).await?;

        let calls = poster.0.into_inner().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Call::Upload(PathBuf::from("img/00.png")));
        assert_eq!(
            calls[1],
            Call::Status {
                text: "一通目".to_owned(),
                media_ids: vec!["media-1".to_owned()],
                in_reply_to: None,
            }
        );
        assert_eq!(
            calls[2],
            Call::Status {
                text: "二通目".to_owned(),
                media_ids: vec![],
                in_reply_to: Some("status-2".to_owned()),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_thread_rejects_oversized_posts() {
        let poster = RecordingPoster::default();
        let posts = vec![Post {
            caption: "大きすぎ".to_owned(),
            images: (0..5).map(|i| PathBuf::from(format!("img/{i:02}.png"))).collect(),
        }];
        let error = publish_thread(&poster, &posts, 4).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ReportError>(),
            Some(ReportError::PostMediaCapExceeded { index: 0, count: 5, cap: 4 })
        ));
        assert!(poster.0.into_inner().unwrap().is_empty());
    }
}
