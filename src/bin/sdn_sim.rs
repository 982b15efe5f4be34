use clap::{Parser, ValueEnum};
use sdnsim_rs::error::ScenarioError;
use sdnsim_rs::net::ONE_HOP_DELAY;
use sdnsim_rs::proto::SplitPolicy;
use sdnsim_rs::scenario::{Scenario, ScenarioOpts};
use sdnsim_rs::sim::SimTime;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "sdn-sim",
    about = "Simulate flood routing plus SDN multipath rules and print every switch's routing table"
)]
struct Args {
    /// Scenario file; reads stdin when omitted
    input: Option<PathBuf>,

    /// Scenario is JSON instead of the whitespace-separated text format
    #[arg(long)]
    json: bool,

    /// Output format of the routing report
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Extra hops a non-SDN neighbor may be farther from the destination than the SDN switch
    #[arg(long, default_value_t = SplitPolicy::default().tra_slack)]
    tra_slack: u32,

    /// Latency of every link
    #[arg(long, default_value_t = ONE_HOP_DELAY.0)]
    latency: u64,

    /// Print the per-event log to stderr
    #[arg(long)]
    trace: bool,
}

fn read_input(path: Option<&PathBuf>) -> Result<String, ScenarioError> {
    match path {
        Some(p) => Ok(fs::read_to_string(p)?),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run(args: &Args) -> Result<String, ScenarioError> {
    let raw = read_input(args.input.as_ref())?;
    let scenario = if args.json {
        Scenario::from_json(&raw)?
    } else {
        Scenario::parse(&raw)?
    };
    let opts = ScenarioOpts {
        link_latency: SimTime(args.latency),
        split_policy: SplitPolicy {
            tra_slack: args.tra_slack,
        },
    };
    let outcome = scenario.run(&opts)?;
    tracing::info!(
        delivered_pkts = outcome.stats.delivered_pkts,
        delivered_volume = outcome.stats.delivered_volume,
        dropped_pkts = outcome.stats.dropped_pkts,
        live_packets = outcome.live_packets,
        "📊 统计"
    );
    match args.report {
        ReportFormat::Text => Ok(outcome.report.render()),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(&outcome.report)? + "\n"),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.trace {
        "warn,sdnsim_rs::trace=info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
