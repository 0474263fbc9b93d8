//! `splice replay`: drive the continuation loop against a recorded transcript.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use splice_backends::{ReplayBackend, Transcript};
use splice_config::AppConfig;
use splice_core::{GenerationRequest, Mode};
use splice_reassembly::CompletionDriver;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{read_file, resolve_class};

pub struct ReplayArgs {
    pub transcript: PathBuf,
    pub original: Option<PathBuf>,
    pub class: Option<String>,
    pub mode: String,
    pub prompt: String,
    pub show_prompts: bool,
}

/// The first-round request, with the backend defaults from `config`.
fn build_request(
    args: &ReplayArgs,
    config: &AppConfig,
) -> Result<GenerationRequest, Box<dyn std::error::Error>> {
    let mode: Mode = args.mode.parse()?;
    let class = resolve_class(args.class.as_deref(), args.original.as_deref())?;

    let request = match mode {
        Mode::Transform => {
            let original = match &args.original {
                Some(path) => read_file(path)?,
                None => String::new(),
            };
            let mut request = GenerationRequest::transform(&args.prompt, original, class);
            if let Some(path) = &args.original {
                request = request.with_label(path.display().to_string());
            }
            request
        }
        Mode::Generate => GenerationRequest::generate(&args.prompt).with_content_class(class),
    };

    Ok(request
        .with_model(config.backend.model.clone())
        .with_temperature(config.backend.temperature)
        .with_max_tokens(config.backend.max_tokens))
}

pub async fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let transcript = Transcript::load(&args.transcript)?;
    let request = build_request(&args, &config)?;

    let backend = Arc::new(ReplayBackend::new(transcript));
    let driver = CompletionDriver::from_config(backend.clone(), &config.reassembly);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = driver.reassemble_with_cancel(request, cancel).await;

    if args.show_prompts {
        for (i, prompt) in backend.prompts().iter().enumerate() {
            eprintln!("── prompt {} ──", i + 1);
            eprintln!("{prompt}");
        }
    }

    let outcome = result?;
    if outcome.truncated {
        warn!(
            rounds = outcome.rounds,
            stop_reason = %outcome.stop_reason,
            "Artifact may be incomplete"
        );
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(outcome.text.as_bytes())?;
    if !outcome.text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }

    eprintln!(
        "rounds: {}  tokens: {}  finish: {}  stop: {}  truncated: {}  unused rounds in transcript: {}",
        outcome.rounds,
        outcome.tokens,
        outcome.finish,
        outcome.stop_reason,
        outcome.truncated,
        backend.remaining()
    );

    Ok(())
}
