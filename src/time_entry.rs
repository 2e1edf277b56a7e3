use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// mite上に既に存在するタイムエントリー。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub service_id: Option<i64>,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub minutes: i64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub tracking: Option<TrackingState>,
}

/// ストップウォッチが動いているエントリーに付くトラッキング情報。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TrackingState {
    pub minutes: i64,
}

impl TimeEntry {
    /// 既存エントリーとの同一性判定に使うキー。
    pub fn spec(&self) -> TimeEntrySpec {
        TimeEntrySpec::new(self.project_id, self.service_id, &self.note)
    }

    /// 表示に使う分数。トラッキング中はストップウォッチの値を優先する。
    pub fn tracked_minutes(&self) -> i64 {
        self.tracking
            .as_ref()
            .map(|tracking| tracking.minutes)
            .unwrap_or(self.minutes)
    }
}

/// アクティビティを解決した結果のタイムエントリー仕様。
///
/// ノートは構築時に前後の空白を取り除く。既存エントリーの検索と
/// 新規作成のペイロードの両方にこの形を使う。
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct TimeEntrySpec {
    pub project_id: Option<i64>,
    pub service_id: Option<i64>,
    pub note: String,
}

impl TimeEntrySpec {
    pub fn new(project_id: Option<i64>, service_id: Option<i64>, note: &str) -> Self {
        Self {
            project_id,
            service_id,
            note: note.trim().to_string(),
        }
    }
}

/// 分数を`1h5m`の形で表示するためのラッパー。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinuteCount(pub i64);

impl fmt::Display for MinuteCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h{}m", self.0 / 60, self.0 % 60)
    }
}
