use std::str::FromStr;

use log::LevelFilter;

pub fn parse_level(raw: &str) -> LevelFilter {
    LevelFilter::from_str(raw.trim()).unwrap_or(LevelFilter::Info)
}

/// Sends records to stdout and appends them to `log_file`.
pub fn setup_logger(level: &str, log_file: &str) -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(parse_level(level))
        // both clients are chatty at info
        .level_for("serenity", LevelFilter::Warn)
        .level_for("tracing", LevelFilter::Warn)
        .level_for("mongodb", LevelFilter::Warn)
        .chain(std::io::stdout())
        .chain(fern::log_file(log_file)?)
        .apply()?;
    Ok(())
}
