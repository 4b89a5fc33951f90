#![allow(clippy::disallowed_methods)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use scribe_core::{ArticleStatus, Format, Length, Notification, StageError, artifact};
use serde_json::json;

use common::{FakeAudio, FakeSummarizer, FakeThumbnail, FakeTitle, Harness, ScriptedQueue};

#[tokio::test]
async fn text_article_becomes_ready_without_synthesis() {
    let h = Harness::new();
    let id = h.article(Format::Text, Length::Short);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Ready);
    assert_eq!(article.original_content.as_deref(), Some("FULL TEXT"));
    assert_eq!(article.summary.as_deref(), Some("SUMMARY"));
    assert_eq!(article.title.as_deref(), Some("Generated Title"));
    assert_eq!(
        article.thumbnail_path,
        Some(format!("https://cdn.test/{}", artifact::thumbnail_key(id)))
    );
    assert!(article.audio_file_path.is_none());
    assert!(article.video_file_path.is_none());
    assert!(article.error_message.is_none());

    assert_eq!(h.audio.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.fake_video.generate_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        h.artifacts.content_type(&artifact::thumbnail_key(id)).as_deref(),
        Some("image/png")
    );

    assert_eq!(
        h.notifications(),
        vec![Notification::ArticleReady {
            article_id: id,
            title: "Generated Title".into(),
        }]
    );
}

#[tokio::test]
async fn defaults_fill_missing_language_and_style() {
    let h = Harness::new();
    let id = h.article(Format::Text, Length::Long);

    h.pipeline().process(id).await;

    let calls = h.summarizer.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            "https://example.com/a".to_string(),
            Length::Long,
            "en".to_string(),
            "summarize".to_string()
        )]
    );
}

#[tokio::test]
async fn extraction_failure_fails_audio_article() {
    let mut h = Harness::new();
    h.summarizer = Arc::new(FakeSummarizer::failing(StageError::Extraction(
        "page returned 404".into(),
    )));
    let id = h.article(Format::Audio, Length::Medium);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Failed);
    let message = article.error_message.unwrap();
    assert!(message.starts_with("Failed to summarize: "));
    assert!(message.contains("extraction"));

    assert!(article.summary.is_none());
    assert!(article.original_content.is_none());
    assert!(article.title.is_none());
    assert!(article.thumbnail_path.is_none());
    assert!(article.audio_file_path.is_none());
    assert_eq!(h.audio.calls.load(Ordering::SeqCst), 0);

    assert_eq!(
        h.notifications(),
        vec![Notification::ArticleFailed {
            article_id: id,
            reason: "Failed to summarize".into(),
        }]
    );
}

#[tokio::test]
async fn video_article_polls_until_completed() {
    let mut h = Harness::new();
    let queue = ScriptedQueue::new(
        vec!["PENDING", "PENDING", "PENDING", "COMPLETED"],
        json!({ "data": { "video": { "url": "https://fal.test/out.mp4" } } }),
    );
    let polls = queue.polls.clone();
    h.video = common::scripted_video(queue, h.work_dir.path());
    let id = h.article(Format::Video, Length::Long);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Ready);
    assert_eq!(article.duration_seconds, Some(60));
    assert_eq!(
        article.video_file_path,
        Some(format!("https://cdn.test/{}", artifact::video_key(id)))
    );
    assert_eq!(polls.load(Ordering::SeqCst), 4);

    let uploads = h.artifacts.uploads.lock().unwrap();
    let (bytes, content_type) = &uploads[&artifact::video_key(id)];
    assert_eq!(bytes.as_slice(), b"mp4-bytes");
    assert_eq!(content_type, "video/mp4");
    drop(uploads);

    assert_eq!(h.leftover_files(), 0);
}

#[tokio::test]
async fn video_poll_exhaustion_fails_with_timeout() {
    let mut h = Harness::new();
    let queue = ScriptedQueue::new(vec!["PENDING"], json!({}));
    let polls = queue.polls.clone();
    h.video = common::scripted_video(queue, h.work_dir.path());
    let id = h.article(Format::Video, Length::Short);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Failed);
    let message = article.error_message.unwrap();
    assert!(message.starts_with("Failed to generate video: timed out"));
    assert!(message.contains("60 attempts"));
    assert_eq!(polls.load(Ordering::SeqCst), 60);
    assert!(article.video_file_path.is_none());
    assert!(article.duration_seconds.is_none());

    assert_eq!(
        h.notifications(),
        vec![Notification::ArticleFailed {
            article_id: id,
            reason: "Failed to generate video".into(),
        }]
    );
}

#[tokio::test]
async fn title_failure_falls_back_and_continues() {
    let mut h = Harness::new();
    h.title = Arc::new(FakeTitle(Err(StageError::Title("quota".into()))));
    let id = h.article(Format::Audio, Length::Short);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Ready);
    assert_eq!(article.title.as_deref(), Some("Untitled Article"));
    assert!(article.thumbnail_path.is_some());
    assert_eq!(
        article.audio_file_path,
        Some(format!("https://cdn.test/{}", artifact::audio_key(id)))
    );
    assert_eq!(
        h.artifacts.content_type(&artifact::audio_key(id)).as_deref(),
        Some("audio/mpeg")
    );
    assert_eq!(
        h.notifications(),
        vec![Notification::ArticleReady {
            article_id: id,
            title: "Untitled Article".into(),
        }]
    );
}

#[tokio::test]
async fn thumbnail_failures_are_not_fatal() {
    let mut h = Harness::new();
    h.thumbnail = Arc::new(FakeThumbnail(Err(StageError::Thumbnail("no image".into()))));
    let id = h.article(Format::Text, Length::Medium);
    h.pipeline().process(id).await;
    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Ready);
    assert!(article.thumbnail_path.is_none());

    let h = Harness::new();
    h.artifacts.fail_prefix("thumbnails/");
    let id = h.article(Format::Audio, Length::Medium);
    h.pipeline().process(id).await;
    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Ready);
    assert!(article.thumbnail_path.is_none());
    assert!(article.audio_file_path.is_some());
}

#[tokio::test]
async fn speech_failure_fails_article() {
    let mut h = Harness::new();
    h.audio = Arc::new(FakeAudio::new(Err(StageError::Synthesis("voice missing".into()))));
    let id = h.article(Format::Audio, Length::Short);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Failed);
    assert_eq!(
        article.error_message.as_deref(),
        Some("Failed to convert to speech: synthesis failed: voice missing")
    );
    assert!(article.audio_file_path.is_none());
    // Stages before the failure keep their results.
    assert_eq!(article.summary.as_deref(), Some("SUMMARY"));
    assert!(article.thumbnail_path.is_some());
}

#[tokio::test]
async fn failed_video_upload_still_removes_download() {
    let h = Harness::new();
    h.artifacts.fail_prefix("videos/");
    let id = h.article(Format::Video, Length::Medium);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Failed);
    assert!(
        article
            .error_message
            .unwrap()
            .starts_with("Failed to upload video: ")
    );
    assert_eq!(h.fake_video.downloads.lock().unwrap().len(), 1);
    assert_eq!(h.leftover_files(), 0);
    assert_eq!(h.notifications().len(), 1);
}

#[tokio::test]
async fn video_duration_follows_length() {
    let h = Harness::new();
    let id = h.article(Format::Video, Length::Medium);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Ready);
    assert_eq!(article.duration_seconds, Some(30));
    assert_eq!(h.leftover_files(), 0);
}

#[tokio::test]
async fn persistence_failures_follow_stage_policy() {
    // Title write failures are tolerated.
    let h = Harness::new();
    h.store.fail_on("save_title");
    let id = h.article(Format::Text, Length::Short);
    h.pipeline().process(id).await;
    assert_eq!(h.store.get(id).status, ArticleStatus::Ready);

    // Losing the summary is fatal.
    let h = Harness::new();
    h.store.fail_on("save_content");
    let id = h.article(Format::Text, Length::Short);
    h.pipeline().process(id).await;
    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Failed);
    assert!(
        article
            .error_message
            .unwrap()
            .starts_with("Failed to save summary: ")
    );
    assert_eq!(h.notifications().len(), 1);

    // Losing the audio path is fatal.
    let h = Harness::new();
    h.store.fail_on("save_audio");
    let id = h.article(Format::Audio, Length::Short);
    h.pipeline().process(id).await;
    assert_eq!(h.store.get(id).status, ArticleStatus::Failed);
}

#[tokio::test]
async fn unwritable_processing_status_aborts_silently() {
    let h = Harness::new();
    h.store.fail_on("set_processing");
    let id = h.article(Format::Audio, Length::Short);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Queued);
    assert!(h.summarizer.calls.lock().unwrap().is_empty());
    assert!(h.notifications().is_empty());
}

#[tokio::test]
async fn unwritable_ready_status_falls_back_to_failed() {
    let h = Harness::new();
    h.store.fail_on("set_ready");
    let id = h.article(Format::Text, Length::Short);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Failed);
    assert!(
        article
            .error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Failed to mark article as ready"))
    );
    assert!(h.notifications().is_empty());
}

#[tokio::test]
async fn unwritable_terminal_status_sends_nothing() {
    let h = Harness::new();
    h.store.fail_on("set_ready");
    h.store.fail_on("set_failed");
    let id = h.article(Format::Text, Length::Short);

    h.pipeline().process(id).await;

    assert_eq!(h.store.get(id).status, ArticleStatus::Processing);
    assert!(h.notifications().is_empty());
}

#[tokio::test]
async fn status_moves_through_processing_once() {
    let h = Harness::new();
    let id = h.article(Format::Audio, Length::Short);

    h.pipeline().process(id).await;

    let statuses: Vec<ArticleStatus> = h
        .store
        .status_writes()
        .iter()
        .map(|c| c.status())
        .collect();
    assert_eq!(statuses, vec![ArticleStatus::Processing, ArticleStatus::Ready]);
}

#[tokio::test]
async fn notification_errors_leave_article_untouched() {
    let mut h = Harness::new();
    h.notifier = Arc::new(common::RecordingNotifier {
        fail: true,
        ..Default::default()
    });
    let id = h.article(Format::Text, Length::Short);

    h.pipeline().process(id).await;

    let article = h.store.get(id);
    assert_eq!(article.status, ArticleStatus::Ready);
    assert!(article.error_message.is_none());
    assert_eq!(h.notifications().len(), 1);
}
