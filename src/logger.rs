use chrono::Local;
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m\x1b[1m",
        Level::Warn => "\x1b[33m\x1b[1m",
        Level::Info => "\x1b[32m\x1b[1m",
        Level::Debug => "\x1b[36m\x1b[1m",
        Level::Trace => "\x1b[90m\x1b[1m",
    }
}

/// `RUST_LOG` が無ければ info レベルでロガーを初期化
///
/// 二重初期化はエラーにせず無視する（テストから複数回呼ばれるため）
pub fn init_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {}{:<5}\x1b[0m [{}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                level_color(record.level()),
                record.level(),
                record.target(),
                record.args(),
            )
        })
        .try_init();
}
