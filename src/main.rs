use clap::Parser;
use http_probe::client::{Connector, NetConnector, Requester};
use http_probe::error::{Error, Result};
use http_probe::profile::{profile, DialFailurePolicy};
use http_probe::report::{BodyReport, ProfileReport};
use http_probe::url::RequestTarget;
use std::convert::TryFrom;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::process;
use std::time::Duration;

mod logger;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Requests a URL and prints the response body, or profiles repeated requests."
)]
struct Args {
    /// A full URL, e.g. https://www.cloudflare.com
    #[arg(long)]
    url: String,

    /// Number of requests to profile; 0 or less prints a single response body
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    profile: i64,

    /// Record connection failures in the profile instead of exiting on the first one
    #[arg(long = "keep-going")]
    keep_going: bool,

    /// Connect, read and write timeout in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Single,
    Profile(NonZeroUsize),
}

#[derive(Debug)]
struct ProbeConfig {
    url: String,
    target: RequestTarget,
    mode: Mode,
    policy: DialFailurePolicy,
    timeout: Option<Duration>,
}

impl ProbeConfig {
    fn from_args(args: Args) -> Result<Self> {
        let target = args.url.parse()?;
        let mode = if args.profile <= 0 {
            Mode::Single
        } else {
            let count = usize::try_from(args.profile)
                .ok()
                .and_then(NonZeroUsize::new)
                .ok_or_else(|| {
                    Error::ParseError(format!("profile count {} is too large", args.profile))
                })?;
            Mode::Profile(count)
        };
        let policy = if args.keep_going {
            DialFailurePolicy::RecordAndContinue
        } else {
            DialFailurePolicy::FailFast
        };

        Ok(ProbeConfig {
            url: args.url,
            target,
            mode,
            policy,
            timeout: args.timeout.map(Duration::from_millis),
        })
    }

    fn connector(&self) -> NetConnector {
        match self.timeout {
            Some(timeout) => NetConnector::new().with_timeout(timeout),
            None => NetConnector::new(),
        }
    }
}

fn run<C: Connector, W: Write>(config: &ProbeConfig, connector: C, out: &mut W) -> Result<()> {
    let requester = Requester::new(connector);

    match config.mode {
        Mode::Single => {
            let outcome = requester.execute(&config.target, true)?;
            match &outcome.raw_body {
                Some(body) => write!(out, "{}", BodyReport(body))?,
                None => writeln!(out, "read error: {}", outcome.error_code())?,
            }
        }
        Mode::Profile(count) => {
            let summary = profile(&requester, &config.target, count, config.policy)?;
            write!(
                out,
                "{}",
                ProfileReport {
                    url: &config.url,
                    summary: &summary,
                }
            )?;
        }
    }
    Ok(())
}

/// Reports a fatal error on `err` and maps the run result to a process exit status.
fn exit_status<W: Write>(result: Result<()>, err: &mut W) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            writeln!(err, "error: {}", e).ok();
            1
        }
    }
}

fn main() {
    let args = Args::parse();
    logger::init_logging(args.verbose);

    let result = ProbeConfig::from_args(args)
        .and_then(|config| run(&config, config.connector(), &mut io::stdout()));
    process::exit(exit_status(result, &mut io::stderr()));
}
