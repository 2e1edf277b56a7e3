use std::io::Write;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::mite::MiteRepository;

/// `show`サブコマンドで表示できるもの。
#[derive(clap::ArgEnum, Clone, Debug)]
pub enum ShowTarget {
    Shortcuts,
    Projects,
    Services,
}

/// `show`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct ShowArgs {
    #[clap(arg_enum, default_value = "shortcuts", help = "What to list.")]
    pub what: ShowTarget,
}

pub struct ShowCommand<'a, T: MiteRepository> {
    repo: &'a T,
}

impl<'a, T: MiteRepository> ShowCommand<'a, T> {
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// ショートカット定義、またはプロジェクト・サービス名の一覧を表示する。
    ///
    /// ショートカットは設定ファイルに書かれた順で表示する。一覧が長い
    /// 場合はgrepなどへパイプして使う想定。
    pub async fn run<W: Write>(
        &self,
        args: ShowArgs,
        config: &Config,
        writer: &mut W,
    ) -> Result<()> {
        let lines: Vec<String> = match args.what {
            ShowTarget::Shortcuts => config
                .shortcuts
                .iter()
                .map(|(key, expansion)| format!("{} = {}", key, expansion))
                .collect(),
            ShowTarget::Projects => {
                let projects = self
                    .repo
                    .projects()
                    .await
                    .context("Failed to retrieve projects")?;
                projects.into_iter().map(|project| project.name).collect()
            }
            ShowTarget::Services => {
                let services = self
                    .repo
                    .services()
                    .await
                    .context("Failed to retrieve services")?;
                services.into_iter().map(|service| service.name).collect()
            }
        };
        for line in lines {
            writeln!(writer, "{}", line).context("Failed to write the listing")?;
        }
        Ok(())
    }
}
