//! Reimagine - edit an image by describing it and generating it anew.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod display;
mod error;
mod model;
mod output;
mod params;
mod pipeline;
mod ports;
mod session;
mod upload;

use std::path::Path;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::display::TerminalDisplay;
use crate::error::EditError;
use crate::model::{check_describe_model, detect_image_backend, resolve_model};
use crate::output::{resolve_output_path, save_image};
use crate::params::{validate_aspect_ratio, validate_format, validate_timeout};
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::session::EditorSession;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` when set.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "reimagine=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), EditError> {
    // Load config
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(EditError::Config)?;
    tracing::debug!(path = %config_path.display(), "loaded config");

    // Resolve models and validate parameters before touching any service
    let params = cli.params(&config.defaults);
    let describe_model = resolve_model(&params.describe_model);
    let image_model = resolve_model(&params.image_model);
    check_describe_model(&describe_model).map_err(EditError::InvalidArgument)?;
    let backend = detect_image_backend(&image_model).map_err(EditError::InvalidArgument)?;
    validate_aspect_ratio(&params.aspect_ratio, backend).map_err(EditError::InvalidArgument)?;
    validate_format(&params.format).map_err(EditError::InvalidArgument)?;
    validate_timeout(params.timeout_secs).map_err(EditError::InvalidArgument)?;

    if cli.verbose {
        eprintln!("Describe model: {describe_model} (resolved from '{}')", params.describe_model);
        eprintln!("Image model: {image_model} (resolved from '{}')", params.image_model);
    }

    let instruction = cli.resolve_instruction()?;
    let stage_timeout = Duration::from_secs(params.timeout_secs);

    // Create context based on mode (live / recording / replaying)
    let replay_path = std::env::var("REIMAGINE_REPLAY").ok();
    let is_recording = std::env::var("REIMAGINE_REC").is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session) = if let Some(ref cassette_path) = replay_path {
        if cli.verbose {
            eprintln!("Replaying from: {cassette_path}");
        }
        (ServiceContext::replaying(Path::new(cassette_path))?, None)
    } else {
        let api_key = config.api_key();
        if let Some(warning) = api_key.warning() {
            eprintln!("Warning: {warning}");
        }
        if is_recording {
            if cli.verbose {
                eprintln!("Recording mode enabled");
            }
            let (ctx, session) = ServiceContext::recording(backend, &api_key, stage_timeout);
            (ctx, Some(session))
        } else {
            (ServiceContext::live(backend, &api_key), None)
        }
    };

    let pipeline = Pipeline::new(
        ctx.describer,
        ctx.generator,
        PipelineSettings {
            describe_model,
            image_model,
            aspect_ratio: params.aspect_ratio.clone(),
            timeout: stage_timeout,
        },
        Box::new(TerminalDisplay::stderr(cli.verbose)),
    );
    let mut session = EditorSession::new(pipeline);
    let upload = session.upload(Path::new(&cli.image))?;
    if cli.verbose {
        eprintln!("Image: {} ({})", upload.preview().display(), upload.mime_type());
    }
    session.set_instruction(instruction.clone());
    if !session.can_submit() {
        return Err(EditError::Validation("the instruction must not be empty".to_string()));
    }

    let result = session.submit().await;
    // Recording adapters live inside the session and must be gone before finishing.
    drop(session);

    if let Some(recording) = recording_session {
        match recording.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }

    let image = result?;

    if !cli.no_save {
        let output_path = resolve_output_path(cli.output.as_deref(), &instruction, &params.format);
        save_image(&image, &params.format, &output_path)?;
        eprintln!("Saved: {}", output_path.display());
    }

    if cli.data_uri {
        println!("{}", image.data_uri());
    }

    Ok(())
}
