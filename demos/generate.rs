//! Submit a job and print progress as the update stream arrives.
//!
//! Pass the prompt as arguments. Press Ctrl-C once to ask the server to
//! skip the current image, twice to cancel the job.
//!
//! ```sh
//! RUST_LOG=imagegen_stream=debug cargo run --example generate -- a lighthouse at dusk
//! ```

use imagegen_stream::{GenerationSession, JobRequest, PerfRecorder, SessionConfig, Stage};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = if prompt.is_empty() {
        "a lighthouse at dusk, volumetric fog".to_string()
    } else {
        prompt
    };

    let perf = Arc::new(PerfRecorder::new());
    let session = GenerationSession::new(SessionConfig::default())?.with_observer(perf.clone());

    let styles = session.client().default_styles().await.unwrap_or_default();
    let request = JobRequest::new(prompt).styles(styles);
    println!("Seed: {}", request.image_seed);

    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update();
            println!(
                "  [{}] {} {}% (gallery: {})",
                state.status.update_type.as_str(),
                state.status.title.as_deref().unwrap_or(""),
                state.status.percentage.as_deref().unwrap_or("-"),
                state.gallery.len()
            );
        }
    });

    let control = session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Skipping current image...");
            control.skip().await;
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Cancelling job...");
            control.cancel().await;
        }
    });

    let summary = session.submit(&request).await?;
    let state = session.snapshot();
    println!(
        "Done! {} frame(s), {} recovered error(s), {} image(s)",
        summary.frames,
        summary.recovered,
        state.gallery.len()
    );
    for img in &state.gallery {
        println!("  {}x{} {:.60}", img.width, img.height, img.image_url);
    }
    println!(
        "Average materialize time: {:?}",
        perf.average(Stage::Materialize)
    );

    drop(session);
    printer.abort();
    Ok(())
}
