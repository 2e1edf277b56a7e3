use anyhow::{Context, Result};
use log::info;

use crate::mite::MiteRepository;

pub struct StopCommand<'a, T: MiteRepository> {
    repo: &'a T,
}

impl<'a, T: MiteRepository> StopCommand<'a, T> {
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `stop`サブコマンドの処理を行う。
    ///
    /// ストップウォッチが動いていなければ何もしない。
    pub async fn run(&self) -> Result<()> {
        let tracked = self
            .repo
            .tracking_entry()
            .await
            .context("Failed to read the stopwatch state")?;
        let Some(tracked) = tracked else {
            println!("No clock is running, nothing to do.");
            return Ok(());
        };
        self.repo
            .stop_tracker(tracked.id)
            .await
            .context("Failed to stop the clock")?;
        info!("stopped the clock for entry {}", tracked.id);
        println!("Stopping clock!");
        Ok(())
    }
}
