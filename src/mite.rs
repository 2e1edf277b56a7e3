use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
#[cfg(test)]
use mockall::automock;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiKey;
use crate::pattern::NamedEntity;
use crate::time_entry::{TimeEntry, TimeEntrySpec};

/// miteのプロジェクト。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub customer_name: Option<String>,
}

/// miteのサービス(作業種別)。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub name: String,
}

impl NamedEntity for Project {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }
}

impl NamedEntity for Service {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// ストップウォッチが計測中のエントリー。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TrackedEntry {
    pub id: i64,
}

/// mite APIと通信するためのリポジトリ。
///
/// コマンドはこのtraitにのみ依存し、テストではモックに差し替える。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MiteRepository {
    /// プロジェクトの一覧を取得する。
    async fn projects(&self) -> Result<Vec<Project>>;

    /// サービスの一覧を取得する。
    async fn services(&self) -> Result<Vec<Service>>;

    /// 今日のタイムエントリーを取得する。
    async fn daily_entries(&self) -> Result<Vec<TimeEntry>>;

    /// タイムエントリーを新規作成し、サーバーが採番したエントリーを返す。
    async fn create_entry(&self, spec: &TimeEntrySpec) -> Result<TimeEntry>;

    /// ストップウォッチの状態を返す。動いていなければ`None`。
    async fn tracking_entry(&self) -> Result<Option<TrackedEntry>>;

    /// 指定したエントリーの計測を開始する。
    async fn start_tracker(&self, entry_id: i64) -> Result<()>;

    /// 指定したエントリーの計測を停止する。
    async fn stop_tracker(&self, entry_id: i64) -> Result<()>;
}

// mite APIのレスポンスは1件ごとにリソース名のキーで包まれている。
#[derive(Debug, Deserialize)]
struct ProjectWrapper {
    project: Project,
}

#[derive(Debug, Deserialize)]
struct ServiceWrapper {
    service: Service,
}

#[derive(Debug, Deserialize)]
struct TimeEntryWrapper {
    time_entry: TimeEntry,
}

#[derive(Debug, Deserialize)]
struct TrackerWrapper {
    #[serde(default)]
    tracker: Tracker,
}

#[derive(Debug, Default, Deserialize)]
struct Tracker {
    #[serde(default)]
    tracking_time_entry: Option<TrackedEntry>,
}

#[derive(Debug, Serialize)]
struct TimeEntryPayload<'a> {
    time_entry: &'a TimeEntrySpec,
}

/// mite APIと通信するためのクライアント。
///
/// # Examples
///
/// ```ignore
/// let client = MiteClient::new("https://demo.mite.yo.lk", &api_key)?;
/// let projects = client.projects().await?;
/// ```
pub struct MiteClient {
    client: Client,
    base_url: String,
}

impl MiteClient {
    /// 新しい`MiteClient`を返す。
    ///
    /// 認証キーとUser-Agentは全リクエスト共通のヘッダーとして設定する。
    pub fn new(base_url: &str, api_key: &ApiKey) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
        );
        headers.insert(
            "X-MiteApiKey",
            HeaderValue::from_str(&api_key.to_string())
                .context("Failed to build the api key header")?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build the http client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}.json", self.base_url, resource)
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T> {
        self.client
            .get(self.url(resource))
            .send()
            .await
            .with_context(|| format!("Failed to send request to mite at {}", self.base_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response")
    }
}

#[async_trait]
impl MiteRepository for MiteClient {
    async fn projects(&self) -> Result<Vec<Project>> {
        let wrapped: Vec<ProjectWrapper> = self.get_json("projects").await?;
        info!("length of projects: {}", wrapped.len());
        Ok(wrapped.into_iter().map(|w| w.project).collect())
    }

    async fn services(&self) -> Result<Vec<Service>> {
        let wrapped: Vec<ServiceWrapper> = self.get_json("services").await?;
        info!("length of services: {}", wrapped.len());
        Ok(wrapped.into_iter().map(|w| w.service).collect())
    }

    async fn daily_entries(&self) -> Result<Vec<TimeEntry>> {
        let wrapped: Vec<TimeEntryWrapper> = self.get_json("daily").await?;
        info!("length of time entries: {}", wrapped.len());
        Ok(wrapped.into_iter().map(|w| w.time_entry).collect())
    }

    async fn create_entry(&self, spec: &TimeEntrySpec) -> Result<TimeEntry> {
        let created: TimeEntryWrapper = self
            .client
            .post(self.url("time_entries"))
            .json(&TimeEntryPayload { time_entry: spec })
            .send()
            .await
            .with_context(|| format!("Failed to send request to mite at {}", self.base_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json()
            .await
            .context("Failed to deserialize the created time entry")?;
        info!("created time entry {}", created.time_entry.id);
        Ok(created.time_entry)
    }

    async fn tracking_entry(&self) -> Result<Option<TrackedEntry>> {
        let wrapped: TrackerWrapper = self.get_json("tracker").await?;
        Ok(wrapped.tracker.tracking_time_entry)
    }

    async fn start_tracker(&self, entry_id: i64) -> Result<()> {
        self.client
            .patch(self.url(&format!("tracker/{}", entry_id)))
            .send()
            .await
            .with_context(|| format!("Failed to send request to mite at {}", self.base_url))?
            .error_for_status()
            .context("Request returned an error status")?;
        Ok(())
    }

    async fn stop_tracker(&self, entry_id: i64) -> Result<()> {
        self.client
            .delete(self.url(&format!("tracker/{}", entry_id)))
            .send()
            .await
            .with_context(|| format!("Failed to send request to mite at {}", self.base_url))?
            .error_for_status()
            .context("Request returned an error status")?;
        Ok(())
    }
}
