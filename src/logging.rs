//! Logger setup
//!
//! Plain mode keeps env_logger's compact format. JSON mode writes one
//! object per record so rollouts can be consumed by log pipelines.

use std::io::Write;

/// Pick the level filter for the given flags
pub fn level_for(verbose: u8, quiet: bool, json: bool) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Error;
    }
    match (verbose, json) {
        // JSON consumers want the rollout events by default
        (0, true) => log::LevelFilter::Info,
        (0, false) => log::LevelFilter::Warn,
        (1, _) => log::LevelFilter::Info,
        (2, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Initialize the global logger; `RUST_LOG` refines the level when set
pub fn init(verbose: u8, quiet: bool, json: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_for(verbose, quiet, json));
    builder.parse_default_env();

    if json {
        builder.format(|buf, record| {
            let line = json_record(
                &buf.timestamp_millis().to_string(),
                record.level(),
                record.target(),
                &record.args().to_string(),
            );
            writeln!(buf, "{line}")
        });
    } else {
        builder.format_timestamp(None);
    }

    builder.init();
}

/// Serialize one log record as a JSON line
pub fn json_record(timestamp: &str, level: log::Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    })
    .to_string()
}
