use crate::demo::{run_availability, AvailabilityArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use visit_availability::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Visit Session Availability Service",
    about = "Serve and exercise the prison visit booking-eligibility engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute bookable visit sessions against the bundled fixture prisons
    Availability(AvailabilityArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Availability(args) => run_availability(args).await,
    }
}
