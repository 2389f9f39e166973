use clap::{Args, Parser, Subcommand};
use gaeops_core::{
    AppEngineError, CloudSdkError, GcloudRunOptions, VersionsListConfiguration,
    VersionsSelectionConfiguration,
};
use gaeops_runner::{
    CapturedOutput, CapturingProcessHandler, CloudSdk, GcloudRunnerFactory, OutputStream,
    StreamingProcessHandler, Versions,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(name = "gaeops")]
#[command(about = "Manage App Engine versions through the gcloud CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cloud SDK installation directory (defaults to the SDK holding gcloud on PATH)
    #[arg(long, global = true)]
    sdk_home: Option<PathBuf>,

    /// TOML file with global gcloud options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    gcloud: GcloudArgs,

    /// Print the output of `list` as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Options passed to every gcloud invocation.
#[derive(Args, Debug, Default)]
struct GcloudArgs {
    /// gcloud output format (e.g. json, yaml)
    #[arg(long, global = true)]
    format: Option<String>,

    /// gcloud verbosity (debug, info, warning, error, critical, none)
    #[arg(long, global = true)]
    verbosity: Option<String>,

    /// Service account credential file used instead of the active account
    #[arg(long, global = true)]
    credential_file: Option<PathBuf>,

    /// Extra gcloud flags file; may be repeated
    #[arg(long = "flags-file", global = true)]
    flags_files: Vec<PathBuf>,

    #[arg(long, global = true)]
    metrics_environment: Option<String>,

    #[arg(long, global = true)]
    metrics_environment_version: Option<String>,

    #[arg(long, global = true)]
    show_structured_logs: Option<String>,
}

impl GcloudArgs {
    fn into_run_options(self) -> GcloudRunOptions {
        GcloudRunOptions {
            metrics_environment: self.metrics_environment,
            metrics_environment_version: self.metrics_environment_version,
            credential_file: self.credential_file,
            flags_files: self.flags_files,
            output_format: self.format,
            show_structured_logs: self.show_structured_logs,
            verbosity: self.verbosity,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start serving versions
    Start(SelectionArgs),

    /// Stop serving versions
    Stop(SelectionArgs),

    /// Delete versions
    Delete(SelectionArgs),

    /// List versions
    List(ListArgs),
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Version identifiers
    #[arg(required = true)]
    versions: Vec<String>,

    /// Service the versions belong to
    #[arg(long)]
    service: Option<String>,

    /// Google Cloud project id
    #[arg(long)]
    project: Option<String>,
}

impl SelectionArgs {
    fn into_configuration(self) -> VersionsSelectionConfiguration {
        VersionsSelectionConfiguration {
            versions: self.versions,
            service: self.service,
            project_id: self.project,
        }
    }
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only list versions of this service
    #[arg(long)]
    service: Option<String>,

    /// Google Cloud project id
    #[arg(long)]
    project: Option<String>,

    /// Hide versions that receive no traffic
    #[arg(long)]
    hide_no_traffic: Option<bool>,
}

impl ListArgs {
    fn into_configuration(self) -> VersionsListConfiguration {
        VersionsListConfiguration {
            service: self.service,
            project_id: self.project,
            hide_no_traffic: self.hide_no_traffic,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    if let Err(e) = run(cli) {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        if let Some(hint) = e.downcast_ref::<AppEngineError>().and_then(remediation_hint) {
            eprintln!("{}", hint);
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options =
        config::resolve_run_options(cli.config.as_deref(), cli.gcloud.into_run_options())?;
    let sdk = locate_sdk(cli.sdk_home.as_deref())?;
    let factory = GcloudRunnerFactory::new();

    match cli.command {
        Commands::Start(args) => {
            let versions = Versions::new(factory.new_runner(sdk, options, streaming_handler()));
            versions.start(&args.into_configuration())?;
            println!("✓ Versions started");
        }
        Commands::Stop(args) => {
            let versions = Versions::new(factory.new_runner(sdk, options, streaming_handler()));
            versions.stop(&args.into_configuration())?;
            println!("✓ Versions stopped");
        }
        Commands::Delete(args) => {
            let versions = Versions::new(factory.new_runner(sdk, options, streaming_handler()));
            versions.delete(&args.into_configuration())?;
            println!("✓ Versions deleted");
        }
        Commands::List(args) => {
            let handler = Arc::new(CapturingProcessHandler::new());
            let versions = Versions::new(factory.new_runner(sdk, options, Arc::clone(&handler)));
            let result = versions.list(&args.into_configuration());
            if let Some(output) = handler.take_output() {
                print_output(&output, cli.json)?;
            }
            result?;
        }
    }

    Ok(())
}

fn locate_sdk(sdk_home: Option<&Path>) -> Result<CloudSdk, AppEngineError> {
    match sdk_home {
        Some(home) => Ok(CloudSdk::new(home)),
        None => Ok(CloudSdk::discover()?),
    }
}

fn streaming_handler() -> StreamingProcessHandler {
    StreamingProcessHandler::with_listener(|stream: OutputStream, line: &str| match stream {
        OutputStream::Stdout => println!("{}", line),
        OutputStream::Stderr => eprintln!("{}", line),
    })
}

fn print_output(output: &CapturedOutput, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    print!("{}", output.stdout);
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
    tracing::info!(
        exit_code = ?output.exit_code,
        duration_ms = output.duration_ms,
        "gcloud finished"
    );
    Ok(())
}

fn remediation_hint(err: &AppEngineError) -> Option<&'static str> {
    match err {
        AppEngineError::CloudSdk(CloudSdkError::NotFound(_)) => Some(
            "Install the Google Cloud SDK (https://cloud.google.com/sdk/docs/install) or pass --sdk-home.",
        ),
        AppEngineError::CloudSdk(CloudSdkError::OutOfDate { .. }) => {
            Some("Run `gcloud components update` to upgrade the Cloud SDK.")
        }
        AppEngineError::CloudSdk(CloudSdkError::VersionFile(_)) => {
            Some("The Cloud SDK installation looks damaged; consider reinstalling it.")
        }
        _ => None,
    }
}
