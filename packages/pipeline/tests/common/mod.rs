#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use pipeline::{ArticlePipeline, Capabilities};
use scribe_core::{
    Article, ArticleId, ArticleStore, ArtifactStore, AudioSynthesizer, CapabilityFuture, Format,
    Length, Notification, Notifier, StageError, StageResult, StatusChange, Summarizer, Summary,
    ThumbnailGenerator, TitleGenerator, VideoSynthesizer,
};
use serde_json::Value;
use services::{FalVideoSynthesizer, PollPolicy, QueueStatus, VideoQueue};

/// `ArticleStore` over a map, with switchable write failures.
#[derive(Default)]
pub struct MemoryStore {
    articles: Mutex<HashMap<ArticleId, Article>>,
    failing: Mutex<HashSet<&'static str>>,
    status_writes: Mutex<Vec<StatusChange>>,
}

impl MemoryStore {
    pub fn insert(&self, article: Article) -> ArticleId {
        let id = article.id;
        self.articles.lock().unwrap().insert(id, article);
        id
    }

    pub fn get(&self, id: ArticleId) -> Article {
        self.articles.lock().unwrap().get(&id).cloned().unwrap()
    }

    /// Make the named store operation fail from now on.
    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn status_writes(&self) -> Vec<StatusChange> {
        self.status_writes.lock().unwrap().clone()
    }

    fn check(&self, op: &'static str) -> StageResult<()> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(StageError::Persistence(format!("{op} unavailable")));
        }
        Ok(())
    }

    fn update(
        &self,
        op: &'static str,
        id: ArticleId,
        f: impl FnOnce(&mut Article),
    ) -> StageResult<()> {
        self.check(op)?;
        let mut articles = self.articles.lock().unwrap();
        let article = articles
            .get_mut(&id)
            .ok_or_else(|| StageError::Persistence(format!("article {id} not found")))?;
        f(article);
        article.updated_at = Utc::now();
        Ok(())
    }
}

impl ArticleStore for MemoryStore {
    fn load(&self, id: ArticleId) -> CapabilityFuture<'_, Article> {
        Box::pin(async move {
            self.check("load")?;
            self.articles
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| StageError::Persistence(format!("article {id} not found")))
        })
    }

    fn set_status(&self, id: ArticleId, change: StatusChange) -> CapabilityFuture<'_, ()> {
        Box::pin(async move {
            let op = match change.status() {
                scribe_core::ArticleStatus::Processing => "set_processing",
                scribe_core::ArticleStatus::Ready => "set_ready",
                scribe_core::ArticleStatus::Failed => "set_failed",
                scribe_core::ArticleStatus::Queued => "set_queued",
            };
            self.check(op)?;
            self.status_writes.lock().unwrap().push(change.clone());
            let mut articles = self.articles.lock().unwrap();
            let article = articles
                .get_mut(&id)
                .ok_or_else(|| StageError::Persistence(format!("article {id} not found")))?;
            article
                .apply_status(&change, Utc::now())
                .map_err(|e| StageError::Persistence(e.to_string()))
        })
    }

    fn save_content<'a>(
        &'a self,
        id: ArticleId,
        original_content: &'a str,
        summary: &'a str,
    ) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            self.update("save_content", id, |a| {
                a.original_content = Some(original_content.to_string());
                a.summary = Some(summary.to_string());
            })
        })
    }

    fn save_title<'a>(&'a self, id: ArticleId, title: &'a str) -> CapabilityFuture<'a, ()> {
        Box::pin(async move { self.update("save_title", id, |a| a.title = Some(title.to_string())) })
    }

    fn save_thumbnail<'a>(&'a self, id: ArticleId, url: &'a str) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            self.update("save_thumbnail", id, |a| a.thumbnail_path = Some(url.to_string()))
        })
    }

    fn save_audio<'a>(&'a self, id: ArticleId, url: &'a str) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            self.update("save_audio", id, |a| a.audio_file_path = Some(url.to_string()))
        })
    }

    fn save_video<'a>(
        &'a self,
        id: ArticleId,
        url: &'a str,
        duration_seconds: u32,
    ) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            self.update("save_video", id, |a| {
                a.video_file_path = Some(url.to_string());
                a.duration_seconds = Some(duration_seconds);
            })
        })
    }
}

/// Summarizer returning a fixed result and recording its inputs.
pub struct FakeSummarizer {
    result: StageResult<Summary>,
    pub calls: Mutex<Vec<(String, Length, String, String)>>,
}

impl FakeSummarizer {
    pub fn ok(full_text: &str, summary: &str) -> Self {
        Self {
            result: Ok(Summary {
                full_text: full_text.to_string(),
                summary: summary.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: StageError) -> Self {
        Self {
            result: Err(err),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Summarizer for FakeSummarizer {
    fn summarize<'a>(
        &'a self,
        url: &'a str,
        length: Length,
        language: &'a str,
        style: &'a str,
    ) -> CapabilityFuture<'a, Summary> {
        Box::pin(async move {
            self.calls.lock().unwrap().push((
                url.to_string(),
                length,
                language.to_string(),
                style.to_string(),
            ));
            self.result.clone()
        })
    }
}

pub struct FakeTitle(pub StageResult<String>);

impl TitleGenerator for FakeTitle {
    fn generate_title<'a>(&'a self, _content: &'a str) -> CapabilityFuture<'a, String> {
        Box::pin(async move { self.0.clone() })
    }
}

pub struct FakeThumbnail(pub StageResult<Vec<u8>>);

impl ThumbnailGenerator for FakeThumbnail {
    fn generate_thumbnail<'a>(&'a self, _summary: &'a str) -> CapabilityFuture<'a, Vec<u8>> {
        Box::pin(async move { self.0.clone() })
    }
}

pub struct FakeAudio {
    result: StageResult<Vec<u8>>,
    pub calls: AtomicUsize,
}

impl FakeAudio {
    pub fn new(result: StageResult<Vec<u8>>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }
}

impl AudioSynthesizer for FakeAudio {
    fn synthesize<'a>(
        &'a self,
        _text: &'a str,
        _language: Option<&'a str>,
        _style: Option<&'a str>,
    ) -> CapabilityFuture<'a, Vec<u8>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        })
    }
}

/// Video synthesizer that writes a small file for every download.
pub struct FakeVideo {
    work_dir: PathBuf,
    generate_result: StageResult<String>,
    pub generate_calls: AtomicUsize,
    pub downloads: Mutex<Vec<PathBuf>>,
}

impl FakeVideo {
    pub fn new(work_dir: &Path, generate_result: StageResult<String>) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            generate_result,
            generate_calls: AtomicUsize::new(0),
            downloads: Mutex::new(Vec::new()),
        }
    }
}

impl VideoSynthesizer for FakeVideo {
    fn generate<'a>(
        &'a self,
        _prompt: &'a str,
        _duration_secs: u32,
    ) -> CapabilityFuture<'a, String> {
        Box::pin(async move {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.generate_result.clone()
        })
    }

    fn download<'a>(
        &'a self,
        _video_url: &'a str,
        article_id: ArticleId,
    ) -> CapabilityFuture<'a, PathBuf> {
        Box::pin(async move {
            let path = self.work_dir.join(format!("article_{article_id}.mp4"));
            tokio::fs::write(&path, b"mp4")
                .await
                .map_err(|e| StageError::Synthesis(e.to_string()))?;
            self.downloads.lock().unwrap().push(path.clone());
            Ok(path)
        })
    }
}

/// Artifact store keeping uploads in memory; keys under a failing prefix are rejected.
#[derive(Default)]
pub struct RecordingArtifacts {
    pub uploads: Mutex<HashMap<String, (Vec<u8>, String)>>,
    failing_prefixes: Mutex<Vec<&'static str>>,
}

impl RecordingArtifacts {
    pub fn fail_prefix(&self, prefix: &'static str) {
        self.failing_prefixes.lock().unwrap().push(prefix);
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.uploads.lock().unwrap().get(key).map(|(_, ct)| ct.clone())
    }
}

impl ArtifactStore for RecordingArtifacts {
    fn upload<'a>(
        &'a self,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> CapabilityFuture<'a, String> {
        Box::pin(async move {
            if self
                .failing_prefixes
                .lock()
                .unwrap()
                .iter()
                .any(|p| key.starts_with(p))
            {
                return Err(StageError::Storage(format!("bucket rejected {key}")));
            }
            self.uploads
                .lock()
                .unwrap()
                .insert(key.to_string(), (bytes, content_type.to_string()));
            Ok(format!("https://cdn.test/{key}"))
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> CapabilityFuture<'_, ()> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(notification);
            if self.fail {
                return Err(StageError::Notification("device unreachable".into()));
            }
            Ok(())
        })
    }
}

/// Every collaborator as a concrete fake, so tests can inspect them afterwards.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub summarizer: Arc<FakeSummarizer>,
    pub title: Arc<FakeTitle>,
    pub thumbnail: Arc<FakeThumbnail>,
    pub audio: Arc<FakeAudio>,
    pub fake_video: Arc<FakeVideo>,
    pub video: Arc<dyn VideoSynthesizer>,
    pub artifacts: Arc<RecordingArtifacts>,
    pub notifier: Arc<RecordingNotifier>,
    pub work_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let work_dir = tempfile::tempdir().unwrap();
        let video = Arc::new(FakeVideo::new(
            work_dir.path(),
            Ok("https://fal.test/v.mp4".to_string()),
        ));
        Self {
            store: Arc::new(MemoryStore::default()),
            summarizer: Arc::new(FakeSummarizer::ok("FULL TEXT", "SUMMARY")),
            title: Arc::new(FakeTitle(Ok("Generated Title".to_string()))),
            thumbnail: Arc::new(FakeThumbnail(Ok(vec![0x89, b'P', b'N', b'G']))),
            audio: Arc::new(FakeAudio::new(Ok(b"ID3".to_vec()))),
            fake_video: video.clone(),
            video,
            artifacts: Arc::new(RecordingArtifacts::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            work_dir,
        }
    }

    pub fn article(&self, format: Format, length: Length) -> ArticleId {
        self.store
            .insert(Article::new("owner-1", "https://example.com/a", format, length))
    }

    pub fn pipeline(&self) -> ArticlePipeline {
        let caps = Capabilities {
            summarizer: self.summarizer.clone(),
            title_generator: self.title.clone(),
            thumbnail_generator: self.thumbnail.clone(),
            audio: self.audio.clone(),
            video: self.video.clone(),
            artifacts: self.artifacts.clone(),
            notifier: self.notifier.clone(),
        };
        ArticlePipeline::new(self.store.clone(), caps)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifier.sent.lock().unwrap().clone()
    }

    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.work_dir.path()).unwrap().count()
    }
}

/// Remote video queue replaying scripted statuses; the last one repeats.
pub struct ScriptedQueue {
    statuses: Mutex<VecDeque<QueueStatus>>,
    result: Value,
    pub polls: Arc<AtomicUsize>,
}

impl ScriptedQueue {
    pub fn new(statuses: Vec<&str>, result: Value) -> Self {
        let statuses = statuses
            .into_iter()
            .map(|s| QueueStatus {
                status: s.to_string(),
                response_url: (s == "COMPLETED").then(|| "https://queue.test/result".to_string()),
                ..Default::default()
            })
            .collect();
        Self {
            statuses: Mutex::new(statuses),
            result,
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl VideoQueue for ScriptedQueue {
    async fn submit(&self, _prompt: &str, _duration_secs: u32) -> services::Result<String> {
        Ok("req-42".to_string())
    }

    async fn status(&self, _request_id: &str) -> services::Result<QueueStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap())
        }
    }

    async fn fetch_result(&self, _response_url: &str) -> services::Result<Value> {
        Ok(self.result.clone())
    }

    async fn download(&self, _video_url: &str, dest: &Path) -> services::Result<u64> {
        tokio::fs::write(dest, b"mp4-bytes").await?;
        Ok(9)
    }
}

pub fn scripted_video(queue: ScriptedQueue, work_dir: &Path) -> Arc<dyn VideoSynthesizer> {
    let policy = PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 60,
    };
    Arc::new(FalVideoSynthesizer::new(queue, policy, work_dir))
}
