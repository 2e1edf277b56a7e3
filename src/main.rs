use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};

mod activity;
mod config;
mod console;
mod error;
mod mite;
mod pattern;
mod shortcut;
mod show_command;
mod start_command;
mod status_command;
mod stop_command;
mod time_entry;

use console::TerminalPrompter;
use mite::MiteClient;
use show_command::{ShowArgs, ShowCommand};
use start_command::{StartArgs, StartCommand};
use status_command::{StatusArgs, StatusCommand};
use stop_command::StopCommand;

/// miteのストップウォッチを端末から素早く操作するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- start daily
/// $ cargo run -- stop
/// ```
#[derive(Debug, Parser)]
#[clap(version, about = "Lets you start and stop the clock in mite quickly from your terminal.")]
struct Args {
    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    #[clap(about = "Start the clock for an activity.")]
    Start(StartArgs),

    #[clap(about = "Stop the current clock.", visible_aliases = &["pause", "break"])]
    Stop,

    #[clap(about = "An alias for `start --last`.")]
    Resume,

    #[clap(about = "Display the current state of mite.")]
    Status(StatusArgs),

    #[clap(about = "Show shortcuts, projects or services.", visible_alias = "list")]
    Show(ShowArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logger().context("Failed to initialize logging")?;

    let mut prompter = TerminalPrompter;
    let settings = config::initialize(&mut prompter)?;
    let client = MiteClient::new(&settings.config.url, &settings.api_key)
        .context("Failed to build the mite client")?;
    let mut stdout = io::stdout();

    match args.subcommand {
        SubCommands::Start(start) => {
            StartCommand::new(&client)
                .run(start, &settings.config, &mut prompter)
                .await?
        }
        SubCommands::Stop => StopCommand::new(&client).run().await?,
        SubCommands::Resume => {
            let last = StartArgs {
                last: true,
                activity: vec![],
            };
            StartCommand::new(&client)
                .run(last, &settings.config, &mut prompter)
                .await?
        }
        SubCommands::Status(status) => {
            StatusCommand::new(&client).run(status, &mut stdout).await?
        }
        SubCommands::Show(show) => {
            ShowCommand::new(&client)
                .run(show, &settings.config, &mut stdout)
                .await?
        }
    }

    Ok(())
}

/// ログの出力先とフォーマットを設定する。
///
/// 自前のログはinfo以上、依存クレートはwarn以上を標準エラーへ出す。
fn setup_logger() -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Warn)
        .level_for(env!("CARGO_PKG_NAME"), log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
