use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::adapters::settings::{self, Settings};
use crate::adapters::transport::{HttpTransport, Transport};
use crate::cli::render;
use crate::core::classify::{data_uri, input_type_from_name, mime_prefix};
use crate::core::client::ApiClient;
use crate::core::context::RunContext;
use crate::core::entities::Job;
use crate::core::error::ClientError;
use crate::core::runner::SourceMap;
use crate::utils::lib::create_spinner;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Enable debug logging.
    #[clap(short, long, global = true)]
    pub debug: bool,

    /// API key; falls back to the MODELRUN_API_KEY environment variable.
    #[clap(long, global = true)]
    pub key: Option<String>,

    /// Service base URL; falls back to MODELRUN_BASE_URL.
    #[clap(long, global = true)]
    pub base_url: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Perform model operations.
    Models {
        #[clap(subcommand)]
        action: ModelsAction,
    },
    /// Perform operations on jobs.
    Jobs {
        #[clap(subcommand)]
        action: JobsAction,
    },
    /// Fetch the results of a job.
    Results { job_id: String },
}

#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List all models.
    List,
    /// Inspect a model with the specified model ID.
    Inspect { model_id: String },
    /// Run a model with the specified model ID.
    Run {
        model_id: String,

        /// The model version; defaults to the model's latest version.
        #[clap(short, long)]
        version: Option<String>,

        /// Plain text input to send to the model.
        #[clap(short, long)]
        text: Option<String>,

        /// Comma-delimited list of input files for a run operation.
        #[clap(short = 'f', long, value_delimiter = ',')]
        input_files: Vec<PathBuf>,

        /// Wait for the job to complete and print its results.
        #[clap(short, long)]
        wait: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// List jobs.
    List {
        /// Only jobs still awaiting completion.
        #[clap(long, conflicts_with = "terminated")]
        pending: bool,

        /// Only jobs that reached a terminal status.
        #[clap(long)]
        terminated: bool,
    },
    /// Inspect a job with the specified job ID.
    Inspect { job_id: String },
}

/// Maps each error kind to a distinct process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let client_err = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClientError>());
    match client_err {
        Some(ClientError::MissingConfig(_)) => 2,
        Some(ClientError::InvalidVersion { .. }) | Some(ClientError::Classification(_)) => 3,
        Some(ClientError::Transport(_)) | Some(ClientError::Submission(_)) => 5,
        Some(ClientError::Decode { .. }) | Some(ClientError::SchemaViolation { .. }) => 6,
        None => 1,
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn spawn_interrupt_handler(cancellation: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, canceling in-flight work");
            cancellation.cancel();
        }
    });
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let api_key = match &args.key {
        Some(key) => key.clone(),
        None => settings::resolve(settings::API_KEY_VAR)?,
    };
    let base_url = match &args.base_url {
        Some(url) => url.clone(),
        None => settings::resolve(settings::BASE_URL_VAR)?,
    };
    Ok(Settings::new(api_key, base_url))
}

pub async fn run_cli_interface() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let settings = resolve_settings(&args).context("Failed to resolve settings")?;
    let ctx = RunContext::new();
    spawn_interrupt_handler(ctx.cancellation.clone());

    let transport = HttpTransport::new(&settings.api_key, &settings.base_url)
        .map_err(ClientError::Transport)
        .context("Failed to construct HTTP transport")?;
    let client = ApiClient::new(transport, ctx);

    match args.command {
        Command::Models { action } => match action {
            ModelsAction::List => models_list(&client).await,
            ModelsAction::Inspect { model_id } => models_inspect(&client, &model_id).await,
            ModelsAction::Run {
                model_id,
                version,
                text,
                input_files,
                wait,
            } => models_run(&client, &model_id, version, text, &input_files, wait).await,
        },
        Command::Jobs { action } => match action {
            JobsAction::List {
                pending,
                terminated,
            } => jobs_list(&client, pending, terminated).await,
            JobsAction::Inspect { job_id } => {
                let job = client
                    .get_job(&job_id)
                    .await
                    .context("Failed to fetch job")?;
                render::print_job(&job);
                Ok(())
            }
        },
        Command::Results { job_id } => {
            let results = client
                .get_results(&job_id)
                .await
                .context("Failed to fetch results")?;
            render::print_results(&results);
            Ok(())
        }
    }
}

async fn models_list<T: Transport>(client: &ApiClient<T>) -> Result<()> {
    let spinner = create_spinner("Fetching model details".to_string());
    // Detail fetches complete in arbitrary order; the lock guards only the
    // shared table rows, never the per-slot results.
    let rows = Mutex::new(Vec::new());
    let models = client
        .get_models_with_details(|model| {
            rows.lock()
                .expect("row aggregation lock poisoned")
                .push(render::model_row(model));
            spinner.inc(1);
        })
        .await
        .context("Failed to list models")?;
    spinner.finish_and_clear();

    let rows = rows.into_inner().expect("row aggregation lock poisoned");
    println!("{}", render::models_table(rows));
    info!("Listed {} models", models.len());
    Ok(())
}

async fn models_inspect<T: Transport>(client: &ApiClient<T>, model_id: &str) -> Result<()> {
    let model = client
        .get_model(model_id)
        .await
        .context("Failed to fetch model")?;
    render::print_model(&model);
    Ok(())
}

async fn models_run<T: Transport>(
    client: &ApiClient<T>,
    model_id: &str,
    version: Option<String>,
    text: Option<String>,
    input_files: &[PathBuf],
    wait: bool,
) -> Result<()> {
    let model = client
        .get_model(model_id)
        .await
        .context("Failed to fetch model")?;
    let version = version.unwrap_or_else(|| model.latest_version.clone());

    let job = if let Some(text) = text {
        client
            .run_model_with_text(&model, &version, "input.txt", &text)
            .await
            .context("Failed to submit job")?
    } else if input_files.is_empty() {
        anyhow::bail!("Provide either --text or --input-files");
    } else {
        let mut params = BTreeMap::new();
        for path in input_files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Input file {} has no usable name", path.display()))?;
            let input_type = input_type_from_name(name)?;
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to read input file {}", path.display()))?;
            let mime = mime_prefix(input_type, extension);
            params.insert(name.to_string(), Value::String(data_uri(mime, &data)));
        }
        let mut groups = SourceMap::new();
        groups.insert("0001".to_string(), params);
        client
            .run_model(&model, &version, &groups)
            .await
            .context("Failed to submit job")?
    };

    println!("Submitted job {}", job.job_identifier);
    if !wait {
        return Ok(());
    }

    let spinner = create_spinner(format!("Waiting for job {}", job.job_identifier));
    let mut on_progress = |snapshot: &Job| {
        spinner.set_message(format!(
            "Waiting for job {} (status {})",
            snapshot.job_identifier, snapshot.status
        ));
    };
    let outcome = client
        .wait_until_complete(&job, Some(&mut on_progress))
        .await
        .context("Failed while waiting for job completion")?;
    spinner.finish_and_clear();

    match outcome {
        Some(results) => render::print_results(&results),
        None => println!("Job {} did not complete (canceled)", job.job_identifier),
    }
    Ok(())
}

async fn jobs_list<T: Transport>(
    client: &ApiClient<T>,
    pending: bool,
    terminated: bool,
) -> Result<()> {
    let jobs = if pending {
        client.get_pending_jobs_listing().await
    } else if terminated {
        client.get_terminated_jobs_listing().await
    } else {
        client.get_jobs_listing().await
    }
    .context("Failed to list jobs")?;

    println!("{}", render::jobs_table(&jobs));
    info!("Listed {} jobs", jobs.len());
    Ok(())
}
