use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rapl_raw::Vendor;
use tracing_subscriber::EnvFilter;

use rapl_powertool::config::{DEFAULT_INTERVAL_MS, DEFAULT_TOPOLOGY_ROOT};
use rapl_powertool::{Mode, MsrBackend, PowertoolConfig, PowertoolError};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n",
    "License GPLv3+: GNU GPL version 3 or later <https://gnu.org/licenses/gpl.html>.\n",
    "This is free software: you are free to change and redistribute it.\n",
    "There is NO WARRANTY, to the extent permitted by law.\n",
    "\n",
    "Written by ",
    env!("CARGO_PKG_AUTHORS"),
    "."
);

#[derive(Parser, Debug)]
#[command(name = "rapl-powertool", version, long_version = LONG_VERSION)]
#[command(about = "Measure CPU package power (Watts) or energy (Joules) from RAPL registers")]
#[command(long_about = "Measure average CPU power usage every interval, in Watts, \
or total energy consumption over a duration, in Joules, using the RAPL package \
energy status registers.\n\n\
Prints one line per measurement, with one comma-separated value per CPU package.")]
struct Args {
    #[arg(help = "Register layout of the processor: AMD or INTEL")]
    vendor: Vendor,

    #[arg(
        short,
        long,
        value_name = "MS",
        default_value_t = DEFAULT_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Measure every MS milliseconds, outputs the average power in Watts"
    )]
    interval: u64,

    #[arg(
        short,
        long,
        value_name = "MS",
        help = "Measure once over MS milliseconds, outputs the consumption in Joules"
    )]
    duration: Option<u64>,

    #[arg(
        long,
        value_name = "DIR",
        default_value = DEFAULT_TOPOLOGY_ROOT,
        help = "Directory holding the cpuN/topology entries"
    )]
    topology_root: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        default_value = rapl_raw::msr::DEFAULT_DEVICE_ROOT,
        help = "Directory holding the N/msr device files"
    )]
    device_root: PathBuf,

    #[arg(
        short,
        long,
        help = "Enable verbose logging on stderr (shows all MSR reads)"
    )]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are reported as errors that go to stdout
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = PowertoolConfig {
        topology_root: args.topology_root,
        device_root: args.device_root,
        ..PowertoolConfig::new(args.vendor, Mode::from_options(args.interval, args.duration))
    };
    tracing::debug!("Configuration: {:?}", config);

    let backend = MsrBackend::new(&config.device_root);
    let mut stdout = std::io::stdout().lock();

    match rapl_powertool::run(&config, &backend, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report_failure(&err)),
    }
}

/// Log the fatal error on stderr and return the matching exit status
fn report_failure(err: &PowertoolError) -> u8 {
    tracing::error!("{err}");
    err.exit_code()
}
