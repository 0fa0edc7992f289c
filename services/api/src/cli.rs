use crate::commands::{run_archive, run_export, run_reminders, ArchiveArgs, ExportArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use interview_hub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "InterviewHub",
    about = "Run the InterviewHub hiring API and its maintenance jobs from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service with its background jobs (default command)
    Serve(ServeArgs),
    /// Run one background job against the configured data file and exit
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    /// Write one CSV export of the stored data
    Export(ExportArgs),
    /// Seed a sample hiring pipeline and walk through the main queries
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    /// Email candidates whose interview starts inside the reminder window
    Remind,
    /// Delete stale rejected company selections
    Archive(ArchiveArgs),
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
        Command::Jobs {
            command: JobsCommand::Remind,
        } => run_reminders(),
        Command::Jobs {
            command: JobsCommand::Archive(args),
        } => run_archive(args),
        Command::Export(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}
