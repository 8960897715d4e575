use std::path::PathBuf;
use std::sync::Arc;

use brandstudio::composition::Composition;
use brandstudio::config::StudioConfig;
use brandstudio::session::{Command, Session};
use brandstudio::synth::Synthesizer;
use brandstudio::synth::genai::GenAiClient;

/// Re-render a saved composition on both themes and write it back.
///
/// Usage: `brandstudio <composition.json> [variants|brand-kit]`
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path: PathBuf = args.next().expect("usage: brandstudio <composition.json> [variants|brand-kit]").into();
    let extra = match args.next().as_deref() {
        None => None,
        Some("variants") => Some(Command::GenerateVariants),
        Some("brand-kit") => Some(Command::GenerateBrandKit),
        Some(other) => panic!("unknown operation: {other}"),
    };

    let raw = std::fs::read_to_string(&path).expect("failed to read composition");
    let composition: Composition = serde_json::from_str(&raw).expect("invalid composition JSON");
    let config = StudioConfig::from_env();
    let backend = GenAiClient::from_env().expect("image backend config");
    tracing::info!(model = backend.model(), brand = %composition.brand_name, "rendering composition");

    let synthesizer = Synthesizer::new(Arc::new(backend), config.retry);
    let (session, handle) = Session::new(composition, config, synthesizer);
    let task = tokio::spawn(session.run());

    for command in std::iter::once(Command::SyncNow).chain(extra) {
        handle.send(command).await.expect("session ended early");
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
            let view = handle.view().await.expect("session ended early");
            if !view.synthesizing {
                break;
            }
            if let Some(progress) = view.progress {
                tracing::info!(step = progress.label, percent = progress.percent(), "generating");
            }
        }
        for notice in handle.take_notices().await.expect("session ended early") {
            tracing::info!(level = ?notice.level, code = ?notice.code, "{}", notice.message);
        }
    }

    let composition = handle.shutdown().await.expect("session ended early");
    drop(handle);
    let _ = task.await;
    let json = serde_json::to_string_pretty(&composition).expect("serialize composition");
    std::fs::write(&path, json).expect("failed to write composition");
    tracing::info!(path = %path.display(), "composition saved");
}
