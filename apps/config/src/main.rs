//! sl-config: SecureLock の設定ファイルを表示・変更する管理用 CLI。

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use sl_composition::error::{Result, err};
use sl_composition::{ConfigRuntime, TOGGLE_FEATURES};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sl-config", version, about = "SecureLock configuration manager")]
struct Cli {
    /// 設定ファイルのパス（省略時は既定の場所）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 全設定を表示
    Show,
    /// 既定値に戻す
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// 解除モードを切り替える
    SetMode {
        #[command(subcommand)]
        mode: ModeCommand,
    },
    /// 機能のオン/オフを反転
    Toggle {
        #[arg(value_parser = PossibleValuesParser::new(TOGGLE_FEATURES.iter().map(|(name, _)| *name)))]
        feature: String,
    },
    /// 任意のキーを設定
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum ModeCommand {
    /// 単一キーで解除（空文字で解除キーなし）
    Key {
        #[arg(long)]
        unlock_key: Option<String>,
    },
    /// パスコードで解除
    Passcode {
        #[arg(long)]
        passcode: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sl-config error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let runtime = ConfigRuntime::new(cli.config);
    match cli.command {
        Command::Show => show(&runtime),
        Command::Reset { yes } => {
            if !yes {
                return Err(err("reset overwrites every setting; pass --yes to confirm"));
            }
            runtime.reset()?;
            println!("Reset {}", runtime.location().display());
            Ok(())
        }
        Command::SetMode { mode } => {
            match mode {
                ModeCommand::Key { unlock_key } => {
                    let cfg = runtime.set_mode_key(unlock_key.as_deref())?;
                    if cfg.unlock.is_no_escape() {
                        println!("Unlock mode: key (no unlock key; the screen cannot be dismissed)");
                    } else {
                        let name = cfg
                            .unlock
                            .unlock_key
                            .and_then(|k| k.name())
                            .unwrap_or_default();
                        println!("Unlock mode: key ({})", name);
                    }
                }
                ModeCommand::Passcode { passcode } => {
                    runtime.set_mode_passcode(&passcode)?;
                    println!("Unlock mode: passcode");
                }
            }
            Ok(())
        }
        Command::Toggle { feature } => {
            let now = runtime.toggle(&feature)?;
            println!("{}: {}", feature, if now { "on" } else { "off" });
            Ok(())
        }
        Command::Set { key, value } => {
            runtime.set(&key, &value)?;
            println!("{} updated", key);
            Ok(())
        }
    }
}

fn show(runtime: &ConfigRuntime) -> Result<()> {
    let listing = runtime.show()?;
    println!("# {}", listing.location.display());
    if let Some(parse_error) = &listing.parse_error {
        println!("# unreadable file, showing defaults: {}", parse_error);
    }
    let width = listing.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &listing.entries {
        println!("{:width$}  {}", key, value, width = width);
    }
    for warning in &listing.warnings {
        println!("# warning: {}", warning);
    }
    Ok(())
}
