use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use mrposc_core::config::{AppConfig, FilterSettings, LogFormat};
use mrposc_filter::{
    AddressFilter, AddressTable, ChannelReceivers, ChannelSink, DispatchSink, MetricsSink,
    OscArg, OscMessage, Outcome, TableConfig, TracingSink,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod input;

/// mrposc - address filter for Magnetic Resonator Piano OSC control messages
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "MRPOSC_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the active address table
    List {
        /// Only show addresses kept for older control surfaces
        #[arg(long)]
        legacy_only: bool,
    },
    /// Classify a single message; exits non-zero when it is rejected
    Check {
        /// Message address, e.g. /ui/volume
        address: String,
        /// Message arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Filter messages read line by line from stdin
    Run,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_config_builder(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => AppConfig::default(),
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate().context("Invalid configuration")?;

    init_logging(&config);
    info!(app = %config.app.name, "Starting address filter");

    let table = load_table(&config.filter)?;
    let filter = AddressFilter::new(table);

    match args.command {
        Command::List { legacy_only } => {
            list(filter.table(), legacy_only);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { address, args } => {
            if check(&filter, address, &args)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Run => {
            run(filter, &config.filter).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn load_table(settings: &FilterSettings) -> Result<Arc<AddressTable>> {
    match &settings.table {
        Some(path) => {
            let table = TableConfig::from_file(path)?.into_table()?;
            info!(path = %path.display(), addresses = table.len(), "Using configured address table");
            Ok(Arc::new(table))
        }
        None => Ok(AddressTable::shared_mrp()),
    }
}

fn list(table: &AddressTable, legacy_only: bool) {
    for spec in table.iter().filter(|spec| !legacy_only || spec.legacy) {
        let marker = if spec.legacy { " [legacy]" } else { "" };
        println!("{:<32} {:<40} {}{}", spec.path, spec.args, spec.summary, marker);
    }
}

/// Returns whether the message was accepted
fn check(filter: &AddressFilter, address: String, args: &[String]) -> Result<bool> {
    let args = args.iter().map(String::as_str).map(input::parse_token).collect();

    match filter.classify(OscMessage::new(address, args)) {
        Outcome::Accepted(msg) => {
            println!("{}", serde_json::to_string(&msg)?);
            Ok(true)
        }
        Outcome::Rejected(rejection) => {
            eprintln!("{}", rejection);
            Ok(false)
        }
    }
}

fn build_sink(channel: ChannelSink, settings: &FilterSettings) -> Box<dyn DispatchSink> {
    let traced = TracingSink::new(channel);
    if settings.metrics {
        Box::new(MetricsSink::new(traced))
    } else {
        Box::new(traced)
    }
}

/// Write accepted messages as JSON lines until the channel closes
async fn drain_accepted<W: Write>(accepted: flume::Receiver<OscMessage>, mut out: W) -> u64 {
    let mut count = 0u64;
    while let Ok(msg) = accepted.recv_async().await {
        count += 1;
        let written = serde_json::to_string(&msg)
            .map_err(anyhow::Error::from)
            .and_then(|line| writeln!(out, "{}", line).map_err(anyhow::Error::from));
        if let Err(e) = written {
            error!(error = %e, "Failed to write accepted message");
        }
    }
    count
}

/// Write each diagnostic once when `echo` is set, otherwise only count them
async fn drain_rejected<W: Write>(
    rejected: flume::Receiver<String>,
    mut out: W,
    echo: bool,
) -> u64 {
    let mut count = 0u64;
    while let Ok(diagnostic) = rejected.recv_async().await {
        count += 1;
        if echo {
            if let Err(e) = writeln!(out, "{}", diagnostic) {
                error!(error = %e, "Failed to write diagnostic");
            }
        }
    }
    count
}

async fn run(filter: AddressFilter, settings: &FilterSettings) -> Result<()> {
    if settings.metrics {
        PrometheusBuilder::new()
            .with_http_listener(settings.metrics_addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(addr = %settings.metrics_addr, "Prometheus exporter listening");
    }

    let (channel, receivers) = ChannelSink::unbounded();
    let ChannelReceivers { accepted, rejected } = receivers;
    let sink = build_sink(channel, settings);

    let accept_task = tokio::spawn(drain_accepted(accepted, std::io::stdout()));
    let reject_task = tokio::spawn(drain_rejected(
        rejected,
        std::io::stderr(),
        settings.log_rejections,
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match input::parse_line(&line) {
            Ok(Some(msg)) => filter.dispatch(msg, &sink),
            Ok(None) => {}
            Err(e) => error!(error = %format!("{:#}", e), "Skipping malformed line"),
        }
    }

    // Closing the senders ends both consumer tasks
    drop(sink);

    let accepted = accept_task.await.context("Accept consumer panicked")?;
    let rejected = reject_task.await.context("Reject consumer panicked")?;
    info!(accepted, rejected, "Input closed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrposc_filter::CollectingSink;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["mrposc", "check", "/ui/volume", "0.8"]).unwrap();
        match args.command {
            Command::Check { address, args } => {
                assert_eq!(address, "/ui/volume");
                assert_eq!(args, vec!["0.8".to_string()]);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = Args::try_parse_from(["mrposc", "check", "/ui/patch/set", "-1"]).unwrap();
        assert!(matches!(args.command, Command::Check { .. }));
    }

    #[test]
    fn test_check() {
        let filter = AddressFilter::mrp();
        assert!(check(&filter, "/midi".to_string(), &["144".to_string()]).unwrap());
        assert!(!check(&filter, "/ui/volum".to_string(), &[]).unwrap());
    }

    #[test]
    fn test_default_table() {
        let table = load_table(&FilterSettings::default()).unwrap();
        assert!(Arc::ptr_eq(&table, &AddressTable::shared_mrp()));
    }

    #[test]
    fn test_build_sink_variants() {
        let filter = AddressFilter::mrp();
        let mut settings = FilterSettings::default();

        for metrics in [true, false] {
            settings.metrics = metrics;
            let (channel, rx) = ChannelSink::unbounded();
            let sink = build_sink(channel, &settings);

            filter.dispatch(OscMessage::from_atoms(vec![OscArg::from("/midi")]), &sink);
            filter.dispatch(OscMessage::from_atoms(vec![OscArg::from("/midi/x")]), &sink);

            assert_eq!(rx.accepted.try_recv().unwrap().address_str(), "/midi");
            assert_eq!(rx.rejected.try_recv().unwrap(), "invalid path: /midi/x");
            assert!(rx.accepted.try_recv().is_err());
            assert!(rx.rejected.try_recv().is_err());
        }

        let collecting = CollectingSink::new();
        filter.dispatch(OscMessage::default(), &collecting);
        assert_eq!(collecting.rejected(), vec!["invalid path: ".to_string()]);
    }

    #[tokio::test]
    async fn test_each_line_emits_once() {
        let filter = AddressFilter::mrp();
        let settings = FilterSettings::default();
        let (channel, rx) = ChannelSink::unbounded();
        let sink = build_sink(channel, &settings);

        for line in [
            r#"["/quality/harmonics/raw", 0, 60, [0.5, 0.25]]"#,
            "/ui/volume nan",
            "007",
            "/mrp/allnotesoff",
        ] {
            let msg = input::parse_line(line).unwrap().unwrap();
            filter.dispatch(msg, &sink);
        }
        drop(sink);

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        assert_eq!(drain_accepted(rx.accepted, &mut stdout).await, 2);
        assert_eq!(drain_rejected(rx.rejected, &mut stderr, true).await, 2);

        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "[\"/quality/harmonics/raw\",0,60,[0.5,0.25]]\n[\"/ui/volume\",\"nan\"]\n"
        );
        assert_eq!(
            String::from_utf8(stderr).unwrap(),
            "invalid path: 007\ninvalid path: /mrp/allnotesoff\n"
        );
    }

    #[tokio::test]
    async fn test_rejections_counted_without_echo() {
        let (tx, rx) = flume::unbounded();
        tx.send("invalid path: /a".to_string()).unwrap();
        tx.send("invalid path: /b".to_string()).unwrap();
        drop(tx);

        let mut stderr = Vec::new();
        assert_eq!(drain_rejected(rx, &mut stderr, false).await, 2);
        assert!(stderr.is_empty());
    }
}
