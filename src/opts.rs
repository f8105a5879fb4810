use std::path::PathBuf;

use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "gymlog", author, about)]
pub struct Opts {
    /// Show only warnings and errors
    #[structopt(short = "s", long = "silent", conflicts_with = "verbose")]
    pub silent: bool,

    /// Show all log messages
    #[structopt(short = "v", long = "verbose", conflicts_with = "silent")]
    pub verbose: bool,

    /// Suppress timestamps in logs, useful with journald
    #[structopt(long = "suppress-log-timestamps")]
    pub suppress_log_timestamps: bool,

    /// Database path
    #[structopt(long, env = "GYMLOG_DB", default_value = "gymlog.sqlite3")]
    pub db: PathBuf,

    /// Settings file path
    #[structopt(parse(from_os_str), env = "GYMLOG_SETTINGS", default_value = "gymlog.toml")]
    pub settings: PathBuf,

    /// Keep running and collect at every quarter-hour boundary
    /// instead of performing one cycle and exiting
    #[structopt(short = "d", long = "daemon")]
    pub daemon: bool,
}
