use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, SetLoggerError};

/// Crates that log at info, everything else only gets through with warnings and errors
const KEEPSAKE_CRATES: [&str; 5] = [
    "keepsake",
    "keepsake_server",
    "keepsake_shop",
    "keepsake_core",
    "keepsake_impls",
];

pub fn init_logger() -> Result<(), SetLoggerError> {
    let dispatch = KEEPSAKE_CRATES.iter().fold(
        fern::Dispatch::new().level(LevelFilter::Warn),
        |dispatch, name| dispatch.level_for(*name, LevelFilter::Info),
    );

    dispatch
        .format(|out, message, record| {
            let time = chrono::Local::now().format("%H:%M:%S").to_string();

            out.finish(format_args!(
                "{} {} {:^8} {}",
                badge(record.level()),
                time.bright_black(),
                label(record.target()),
                message
            ))
        })
        .chain(std::io::stdout())
        .apply()
}

/// The crate a log target belongs to
fn crate_of(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

fn label(target: &str) -> ColoredString {
    match crate_of(target) {
        "keepsake" => "KEEPSAKE".bright_white(),
        "keepsake_server" => "SERVER".bright_green(),
        "keepsake_shop" => "SHOP".bright_purple(),
        "keepsake_core" | "keepsake_impls" => "STORE".blue(),
        other => other.clear(),
    }
}

fn badge(level: Level) -> ColoredString {
    match level {
        Level::Error => " ERR ".black().on_red().bold(),
        Level::Warn => " WRN ".black().on_yellow().bold(),
        Level::Info => " INF ".black().on_blue().bold(),
        Level::Debug => " DBG ".white().on_black(),
        Level::Trace => " TRC ".normal(),
    }
}
