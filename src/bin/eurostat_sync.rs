use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eurostat_sync::catalog::{Catalog, CatalogLoader};
use eurostat_sync::config::Settings;
use eurostat_sync::error::{EurostatError, Phase};
use eurostat_sync::eurostat::EurostatHttpClient;
use eurostat_sync::output::JsonOutput;
use eurostat_sync::pipeline::Pipeline;
use eurostat_sync::schedule::run_monthly;
use eurostat_sync::server::{self, RunJob};
use eurostat_sync::sink::ObjectStoreSink;

const PORT_VAR: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";
const DEFAULT_PORT: u16 = 8080;

#[derive(Parser)]
#[command(name = "eurostat-sync")]
#[command(about = "Publish Eurostat datasets as spreadsheets to blob storage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the pipeline once and print the outcome as JSON")]
    Run(TargetArgs),
    #[command(about = "Serve the HTTP and timer triggers")]
    Serve(ServeArgs),
    #[command(about = "Run the pipeline at the start of every month")]
    Schedule(ScheduleArgs),
    #[command(about = "Print the validated dataset catalog")]
    Catalog(CatalogArgs),
}

#[derive(Args, Clone)]
struct CatalogArgs {
    /// JSON file replacing the built-in catalog
    #[arg(long)]
    catalog: Option<String>,
}

#[derive(Args, Clone)]
struct TargetArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Write spreadsheets under this directory instead of blob storage
    #[arg(long)]
    output_dir: Option<Utf8PathBuf>,
}

#[derive(Args, Clone)]
struct ServeArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[derive(Args, Clone)]
struct ScheduleArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Run once immediately before waiting for the next month
    #[arg(long)]
    run_now: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<EurostatError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &EurostatError) -> u8 {
    match error.phase() {
        Phase::Setup => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_once(args),
        Commands::Serve(args) => run_server(args),
        Commands::Schedule(args) => run_schedule(args),
        Commands::Catalog(args) => {
            let catalog = CatalogLoader::resolve(args.catalog.as_deref())?;
            JsonOutput::print_catalog(&catalog).into_diagnostic()?;
            Ok(())
        }
    }
}

type LivePipeline = Pipeline<EurostatHttpClient, ObjectStoreSink>;

fn build(args: &TargetArgs) -> miette::Result<(LivePipeline, Catalog)> {
    let catalog = CatalogLoader::resolve(args.catalog.catalog.as_deref())?;
    let sink = match &args.output_dir {
        Some(dir) => ObjectStoreSink::local(dir)?,
        None => ObjectStoreSink::azure(&Settings::from_env()?.credential)?,
    };
    let client = EurostatHttpClient::new()?;
    Ok((Pipeline::new(client, sink), catalog))
}

fn run_once(args: TargetArgs) -> miette::Result<()> {
    let (pipeline, catalog) = build(&args)?;
    let result = pipeline.run(&catalog);
    JsonOutput::print_run(&result).into_diagnostic()?;
    Ok(())
}

fn run_server(args: ServeArgs) -> miette::Result<()> {
    let addr = match args.bind {
        Some(addr) => addr,
        None => {
            let port = std::env::var(PORT_VAR)
                .ok()
                .and_then(|port| port.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);
            SocketAddr::from(([0, 0, 0, 0], port))
        }
    };

    let (pipeline, catalog) = build(&args.target)?;
    // The blocking HTTP client must not be dropped inside the server runtime.
    let pipeline = Arc::new(pipeline);
    let job: RunJob = {
        let pipeline = Arc::clone(&pipeline);
        Arc::new(move || pipeline.run(&catalog))
    };

    actix_web::rt::System::new()
        .block_on(server::serve(addr, job))
        .into_diagnostic()?;
    info!("server stopped");
    drop(pipeline);
    Ok(())
}

fn run_schedule(args: ScheduleArgs) -> miette::Result<()> {
    let (pipeline, catalog) = build(&args.target)?;
    if args.run_now {
        pipeline.run(&catalog);
    }
    run_monthly(|| {
        pipeline.run(&catalog);
    });
    Ok(())
}
