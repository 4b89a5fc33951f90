//! Video generation through the Fal queue API.
//!
//! A request goes through four steps: submit, poll until the remote job
//! settles, fetch the result document, and download the finished video.
//! [`VideoQueue`] is the transport for those steps and
//! [`FalVideoSynthesizer`] drives them under a [`PollPolicy`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use scribe_core::{ArticleId, CapabilityFuture, StageError, VideoSynthesizer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::FalConfig;
use crate::error::{Result, ServiceError, check_status};

/// Status document returned while polling a queued request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueStatus {
    pub status: String,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub output: Option<Value>,
}

/// Transport for the remote video queue.
pub trait VideoQueue: Send + Sync + 'static {
    /// Submit a generation request and return the remote request id.
    fn submit(&self, prompt: &str, duration_secs: u32)
    -> impl Future<Output = Result<String>> + Send;

    fn status(&self, request_id: &str) -> impl Future<Output = Result<QueueStatus>> + Send;

    /// Fetch the result document a completed status points at.
    fn fetch_result(&self, response_url: &str) -> impl Future<Output = Result<Value>> + Send;

    /// Write the video at `video_url` to `dest`, returning the number of bytes written.
    fn download(&self, video_url: &str, dest: &Path) -> impl Future<Output = Result<u64>> + Send;
}

/// Fixed-interval polling with an attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

impl PollPolicy {
    /// Longest time a request can spend polling.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Locate the video URL in a result document.
///
/// Checked in order: `url`, `video.url`, `data.video.url`, `data.url`.
pub fn resolve_video_url(result: &Value) -> Option<String> {
    ["/url", "/video/url", "/data/video/url", "/data/url"]
        .iter()
        .find_map(|pointer| result.pointer(pointer).and_then(Value::as_str))
        .map(str::to_string)
}

/// Location of a downloaded video for `article_id`, unique per call.
pub fn video_path(work_dir: &Path, article_id: ArticleId) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    work_dir.join(format!("article_{article_id}_{millis}.mp4"))
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    prompt: &'a str,
    aspect_ratio: &'a str,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
}

/// reqwest implementation of [`VideoQueue`] against `queue.fal.run`.
pub struct FalQueueClient {
    client: Client,
    api_key: Option<String>,
    queue_url: String,
    model: String,
}

impl FalQueueClient {
    pub fn new(config: &FalConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            queue_url: config.queue_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn auth_header(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(|key| format!("Key {key}"))
            .ok_or_else(|| ServiceError::MissingConfig("FAL_API_KEY not set".into()))
    }
}

impl VideoQueue for FalQueueClient {
    async fn submit(&self, prompt: &str, duration_secs: u32) -> Result<String> {
        let auth = self.auth_header()?;
        let url = format!("{}/{}", self.queue_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .json(&SubmitRequest {
                prompt,
                aspect_ratio: "16:9",
                duration: duration_secs,
            })
            .send()
            .await?;

        let response = check_status("fal", response).await?;
        let submitted: SubmitResponse = response.json().await?;
        Ok(submitted.request_id)
    }

    async fn status(&self, request_id: &str) -> Result<QueueStatus> {
        let auth = self.auth_header()?;
        let url = format!(
            "{}/{}/requests/{}/status",
            self.queue_url, self.model, request_id
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .send()
            .await?;

        let response = check_status("fal", response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_result(&self, response_url: &str) -> Result<Value> {
        let auth = self.auth_header()?;
        let response = self
            .client
            .get(response_url)
            .header("Authorization", auth)
            .send()
            .await?;

        let response = check_status("fal", response).await?;
        Ok(response.json().await?)
    }

    async fn download(&self, video_url: &str, dest: &Path) -> Result<u64> {
        let response = self.client.get(video_url).send().await?;
        let response = check_status("fal", response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Drives a [`VideoQueue`] from submission to a downloaded file.
pub struct FalVideoSynthesizer<Q: VideoQueue> {
    queue: Q,
    policy: PollPolicy,
    work_dir: PathBuf,
}

impl FalVideoSynthesizer<FalQueueClient> {
    pub fn from_config(config: &FalConfig) -> Result<Self> {
        let policy = PollPolicy {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        };
        Ok(Self::new(
            FalQueueClient::new(config)?,
            policy,
            config.work_dir.clone(),
        ))
    }
}

impl<Q: VideoQueue> FalVideoSynthesizer<Q> {
    pub fn new(queue: Q, policy: PollPolicy, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            queue,
            policy,
            work_dir: work_dir.into(),
        }
    }

    /// Submit `prompt` and wait for the remote job to produce a video URL.
    pub async fn generate_video(&self, prompt: &str, duration_secs: u32) -> Result<String, StageError> {
        let request_id = self
            .queue
            .submit(prompt, duration_secs)
            .await
            .map_err(|e| StageError::Synthesis(format!("failed to submit request: {e}")))?;

        info!(%request_id, duration_secs, "Submitted video generation request");

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            let status = self
                .queue
                .status(&request_id)
                .await
                .map_err(|e| StageError::Synthesis(format!("failed to check status: {e}")))?;

            debug!(%request_id, attempt, status = %status.status, "Polled video request");

            match status.status.as_str() {
                "COMPLETED" => return self.completed_url(status).await,
                "FAILED" => {
                    return Err(StageError::Synthesis(format!(
                        "video generation failed: {}",
                        status.error.unwrap_or_default()
                    )));
                }
                "PENDING" | "PROCESSING" => continue,
                other => {
                    return Err(StageError::Synthesis(format!("unknown status: {other}")));
                }
            }
        }

        warn!(%request_id, attempts = self.policy.max_attempts, "Video generation did not settle");
        Err(StageError::Timeout(format!(
            "video generation did not complete after {} attempts",
            self.policy.max_attempts
        )))
    }

    async fn completed_url(&self, status: QueueStatus) -> Result<String, StageError> {
        if let Some(response_url) = status.response_url.as_deref() {
            let result = self
                .queue
                .fetch_result(response_url)
                .await
                .map_err(|e| StageError::Synthesis(format!("failed to fetch result: {e}")))?;

            return resolve_video_url(&result).ok_or_else(|| {
                StageError::Synthesis(format!("video URL not found in result response: {result}"))
            });
        }

        status
            .output
            .as_ref()
            .and_then(|output| {
                ["video", "url"]
                    .iter()
                    .find_map(|field| output.get(field).and_then(Value::as_str))
            })
            .map(str::to_string)
            .ok_or_else(|| {
                StageError::Synthesis("video completed but no URL found in response".into())
            })
    }

    /// Download `video_url` into the work directory.
    pub async fn download_video(
        &self,
        video_url: &str,
        article_id: ArticleId,
    ) -> Result<PathBuf, StageError> {
        let to_stage = |e: ServiceError| StageError::Synthesis(e.to_string());

        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| to_stage(e.into()))?;

        let dest = video_path(&self.work_dir, article_id);
        match self.queue.download(video_url, &dest).await {
            Ok(bytes) => {
                info!(%article_id, path = %dest.display(), bytes, "Downloaded video");
                Ok(dest)
            }
            Err(e) => {
                // Partial downloads are never handed out.
                let _ = tokio::fs::remove_file(&dest).await;
                Err(to_stage(e))
            }
        }
    }
}

impl<Q: VideoQueue> VideoSynthesizer for FalVideoSynthesizer<Q> {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        duration_secs: u32,
    ) -> CapabilityFuture<'a, String> {
        Box::pin(self.generate_video(prompt, duration_secs))
    }

    fn download<'a>(
        &'a self,
        video_url: &'a str,
        article_id: ArticleId,
    ) -> CapabilityFuture<'a, PathBuf> {
        Box::pin(self.download_video(video_url, article_id))
    }
}
