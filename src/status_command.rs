use std::io::Write;

use anyhow::{Context, Result};

use crate::mite::MiteRepository;
use crate::time_entry::{MinuteCount, TimeEntry};

/// `status`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct StatusArgs {
    #[clap(
        short = 'f',
        long = "full",
        help = "Display all entries for the day. \
                By default only the currently tracked entry (if any) is displayed."
    )]
    pub full: bool,
}

pub struct StatusCommand<'a, T: MiteRepository> {
    repo: &'a T,
}

impl<'a, T: MiteRepository> StatusCommand<'a, T> {
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `status`サブコマンドの処理を行う。
    ///
    /// ストップウォッチの状態と今日の合計時間を表示する。`--full`なら
    /// 今日の全エントリーを作成順に表示する。
    pub async fn run<W: Write>(&self, args: StatusArgs, writer: &mut W) -> Result<()> {
        let entries = self
            .repo
            .daily_entries()
            .await
            .context("Failed to retrieve today's time entries")?;
        for line in report_status(&entries, args.full) {
            writeln!(writer, "{}", line).context("Failed to write the status report")?;
        }
        Ok(())
    }
}

fn report_status(entries: &[TimeEntry], full: bool) -> Vec<String> {
    let tracked = entries.iter().find(|entry| entry.tracking.is_some());
    let header = if tracked.is_some() {
        "The clock is running!"
    } else {
        "The clock is not running"
    };
    let total = MinuteCount(entries.iter().map(TimeEntry::tracked_minutes).sum());

    let body = if full {
        full_summary(entries)
    } else {
        short_summary(tracked)
    };

    let mut lines = vec![header.to_string()];
    if !body.is_empty() {
        lines.push(String::new());
        lines.extend(body);
        lines.push(String::new());
    }
    lines.push(format!("Total time clocked in today: {}", total));
    lines
}

fn full_summary(entries: &[TimeEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No entries today.".to_string()];
    }
    let mut ordered: Vec<&TimeEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.created_at);
    let mut lines = vec!["Entries today:".to_string()];
    for entry in ordered {
        lines.push(String::new());
        lines.extend(entry_lines(entry));
    }
    lines
}

fn short_summary(tracked: Option<&TimeEntry>) -> Vec<String> {
    let Some(entry) = tracked else {
        return vec![];
    };
    let mut lines = vec!["Below is the entry being tracked.".to_string()];
    lines.extend(entry_lines(entry));
    lines
}

fn entry_lines(entry: &TimeEntry) -> Vec<String> {
    vec![
        format!("Project: {}", entry.project_name),
        format!("Service: {}", entry.service_name),
        format!("Note: {}", entry.note),
        format!("Time spent: {}", MinuteCount(entry.tracked_minutes())),
    ]
}
