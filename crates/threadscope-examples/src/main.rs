use facet::Facet;
use figue as args;
use std::time::Duration;

mod scenarios;

use scenarios::Outcome;

type AnyResult<T> = Result<T, String>;

pub(crate) const DEADLINE_ENV: &str = "THREADSCOPE_DEADLINE_MS";
const DEFAULT_DEADLINE_MS: u64 = 8_000;

/// Exit status when workers are still blocked at the deadline.
const STALLED_EXIT_CODE: i32 = 2;

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    #[facet(args::named, default)]
    deadline_ms: Option<u64>,
    #[facet(args::named, default)]
    workers: Option<usize>,
    #[facet(args::subcommand)]
    command: CommandKind,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum CommandKind {
    BarrierRendezvous,
    CounterIncrement,
    HoldContention,
    MutexLockOrderInversion,
    ProducerConsumer,
}

pub(crate) struct Config {
    pub(crate) deadline: Duration,
    pub(crate) workers: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(Outcome::Completed) => {}
        Ok(Outcome::Stalled { pending }) => {
            tracing::warn!(
                pending = %pending.join(", "),
                "workers still blocked at the deadline; the trace stops where they stalled"
            );
            std::process::exit(STALLED_EXIT_CODE);
        }
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
}

fn run() -> AnyResult<Outcome> {
    let cli = parse_cli()?;
    let cfg = config_from_cli(&cli)?;
    dispatch_command(&cfg, &cli.command)
}

fn parse_cli() -> AnyResult<Cli> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("threadscope-examples")
                .description("Run traced threading workloads; the lock trace goes to stdout")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();

    args::Driver::new(figue_config)
        .run()
        .into_result()
        .map(|v| v.value)
        .map_err(|e| e.to_string())
}

fn config_from_cli(cli: &Cli) -> AnyResult<Config> {
    let deadline_ms = match cli.deadline_ms {
        Some(ms) => ms,
        None => match std::env::var(DEADLINE_ENV) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|e| format!("invalid {DEADLINE_ENV} value {raw:?}: {e}"))?,
            _ => DEFAULT_DEADLINE_MS,
        },
    };

    if cli.workers == Some(0) {
        return Err("--workers must be at least 1".to_owned());
    }

    Ok(Config {
        deadline: Duration::from_millis(deadline_ms),
        workers: cli.workers,
    })
}

fn dispatch_command(cfg: &Config, command: &CommandKind) -> AnyResult<Outcome> {
    match command {
        CommandKind::BarrierRendezvous => scenarios::barrier_rendezvous::run(cfg),
        CommandKind::CounterIncrement => scenarios::counter_increment::run(cfg),
        CommandKind::HoldContention => scenarios::hold_contention::run(cfg),
        CommandKind::MutexLockOrderInversion => scenarios::mutex_lock_order_inversion::run(cfg),
        CommandKind::ProducerConsumer => scenarios::producer_consumer::run(cfg),
    }
}
