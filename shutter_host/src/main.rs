use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use shutter_host::config::{self, Config, Overrides};
use shutter_host::{PinLink, Session, SessionEnd, SessionError, serial};

/// Interactive shutter control over a serial pin link.
#[derive(Debug, Parser)]
#[command(name = "shutter-host", version)]
struct Cli {
    /// Serial port of the board; defaults to the configured or OS-specific port
    port: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Baud rate (overrides the configuration file)
    #[arg(long)]
    baud: Option<u32>,

    /// Shutter pin number (overrides the configuration file)
    #[arg(long)]
    pin: Option<u8>,

    /// Drive an in-process simulated board instead of a serial port
    #[cfg(feature = "sim-in-host")]
    #[arg(long)]
    simulate: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_config(&self) -> Result<Config, SessionError> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                config::load_config(path)?
            }
            None => Config::default(),
        };
        config.apply_overrides(Overrides {
            port: self.port.clone(),
            baud: self.baud,
            pin: self.pin,
        })?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    // Logs go to stderr; stdout carries the interactive transcript.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(end @ SessionEnd::Interrupted) => {
            // The pending stdin read cannot be cancelled and would hold up
            // runtime shutdown until the next Enter.
            std::process::exit(end.exit_code().into())
        }
        Ok(end) => ExitCode::from(end.exit_code()),
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<SessionEnd, SessionError> {
    let config = cli.load_config()?;

    #[cfg(feature = "sim-in-host")]
    if cli.simulate {
        use shutter_simulator::SimulatedBoard;

        let polarity = config.shutter.polarity()?;
        let (stream, _probe) = SimulatedBoard::spawn(config.shutter.pin, polarity);
        let mut config = config;
        config.serial.settle_ms = 0;
        return drive(shutter_host::FirmataLink::new(stream, "simulated board"), &config).await;
    }

    let port = config.serial.resolved_port();
    let link = serial::open_port(&port, config.serial.baud)?;
    drive(link, &config).await
}

async fn drive<L: PinLink>(link: L, config: &Config) -> Result<SessionEnd, SessionError> {
    let mut session = Session::start(link, config).await?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout().lock();
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    session.run(stdin, &mut stdout, interrupt).await
}
