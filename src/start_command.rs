use std::collections::HashMap;

use anyhow::{Context, Result};
use log::info;

use crate::activity::to_time_entry_spec;
use crate::config::Config;
use crate::console::{build_menu, select_entry, Prompter};
use crate::mite::MiteRepository;
use crate::time_entry::{TimeEntry, TimeEntrySpec};

/// `start`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct StartArgs {
    #[clap(
        short = 'l',
        long = "last",
        help = "Start the last clock. Ignored if an activity is specified."
    )]
    pub last: bool,

    #[clap(
        value_name = "ACTIVITY",
        help = "Up to three items combining shortcuts, selector patterns and a note."
    )]
    pub activity: Vec<String>,
}

pub struct StartCommand<'a, T: MiteRepository> {
    repo: &'a T,
}

impl<'a, T: MiteRepository> StartCommand<'a, T> {
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `start`サブコマンドの処理を行う。
    ///
    /// アクティビティが指定されていればタイムエントリー仕様へ解決し、
    /// 同じ仕様の既存エントリーがあればそれを、無ければ新規作成した
    /// エントリーの計測を開始する。アクティビティが無い場合は今日の
    /// エントリーから選択する。
    pub async fn run(
        &self,
        args: StartArgs,
        config: &Config,
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        let entries = self
            .repo
            .daily_entries()
            .await
            .context("Failed to retrieve today's time entries")?;

        let entry = if !args.activity.is_empty() {
            let projects = self
                .repo
                .projects()
                .await
                .context("Failed to retrieve projects")?;
            let services = self
                .repo
                .services()
                .await
                .context("Failed to retrieve services")?;
            let spec = to_time_entry_spec(&args.activity, &config.shortcuts, &projects, &services)?;
            self.idempotent_entry(&entries, &spec).await?
        } else {
            if entries.is_empty() {
                println!("No entries found for today, please specify an activity.");
                return Ok(());
            }
            let mut entries = entries;
            entries.sort_by_key(|entry| entry.updated_at);
            if args.last {
                entries
                    .into_iter()
                    .next_back()
                    .context("No entries found for today")?
            } else {
                let menu = build_menu(&config.menu_keys, &entries);
                select_entry(prompter, &menu).context("Failed to read the menu selection")?
            }
        };

        self.repo
            .start_tracker(entry.id)
            .await
            .context("Failed to start the clock")?;
        info!("started the clock for entry {}", entry.id);
        println!("Clock started!");

        Ok(())
    }

    /// 仕様に一致する既存エントリーを探し、無ければ新規作成する。
    ///
    /// 同じアクティビティで繰り返し`start`しても重複したエントリーは
    /// 作られない。
    async fn idempotent_entry(
        &self,
        entries: &[TimeEntry],
        spec: &TimeEntrySpec,
    ) -> Result<TimeEntry> {
        let existing: HashMap<TimeEntrySpec, &TimeEntry> =
            entries.iter().map(|entry| (entry.spec(), entry)).collect();
        if let Some(found) = existing.get(spec) {
            info!("reusing existing entry {}", found.id);
            return Ok((*found).clone());
        }
        self.repo
            .create_entry(spec)
            .await
            .context("Failed to create a time entry")
    }
}
