#![windows_subsystem = "windows"]
//! securelock: 全画面ロックを表示し、解除されるまで違反入力の証拠を記録する。

use clap::Parser;
use sl_composition::LockRuntime;
use sl_composition::domain::model::{LockRequest, LockSessionReport};
use sl_composition::error::Result;
use sl_composition::ui_common::i18n::t;
use sl_composition::ui_common::message_box::show_error_msgbox;
use sl_log_utils::{install_panic_hook, write_lifecycle_line};
use std::path::PathBuf;
use std::process::ExitCode;

const COMPONENT: &str = "securelock";

#[derive(Parser)]
#[command(name = "securelock", version, about = "SecureLock lock screen")]
struct Args {
    /// 設定ファイルのパス（省略時は既定の場所）
    #[arg(long)]
    config: Option<PathBuf>,

    /// キーフックとタスクマネージャー抑止を使わない（開発用）
    #[arg(long)]
    unprotected: bool,
}

fn main() -> ExitCode {
    install_panic_hook(COMPONENT);
    let args = Args::parse();
    write_lifecycle_line(COMPONENT, "start");

    match run(args) {
        Ok(report) => {
            write_lifecycle_line(
                COMPONENT,
                &format!(
                    "exit: unlocked={} violations={} fires={}",
                    report.unlocked, report.violations, report.fires_accepted
                ),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            write_lifecycle_line(COMPONENT, &format!("exit with error: {e}"));
            show_error_msgbox(&t().error_startup(&e.to_string()));
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> Result<LockSessionReport> {
    let runtime = LockRuntime::new(args.config)?;
    write_lifecycle_line(
        COMPONENT,
        &format!(
            "config={} log={}",
            runtime.config_location().display(),
            runtime.log_location()
        ),
    );
    runtime.run(LockRequest {
        unprotected: args.unprotected,
    })
}
