//! # imagegen-stream
//!
//! Async client for image-generation servers that stream job progress back
//! over a single long-lived HTTP response.
//!
//! A submitted job answers with a body of JSON update frames (`init`,
//! `preview`, `results`, `finished`). Frames do not line up with transport
//! chunks: one chunk may carry several frames separated by a blank line, or
//! only part of one. This crate turns that byte stream back into discrete
//! updates, recovers from malformed frames without losing the rest of the
//! job, and keeps a [`JobProgressState`] (status, current preview, gallery
//! of finished images) that a UI can watch.
//!
//! ## Features
//!
//! - **Incremental decoding**: UTF-8 safe chunk accumulation with a
//!   whole-buffer fast path and `"\n\n"`-delimited recovery
//! - **Pixel materialization**: raw `[height][width][3]` RGB arrays become
//!   PNG `data:` URLs; ready-made image references pass straight through
//! - **Watchable state**: every applied frame is published on a
//!   `tokio::sync::watch` channel
//! - **Control calls**: best-effort cancel and skip while a job streams
//! - **Stage observers**: optional timing hooks around decode, classify,
//!   materialize and apply
//!
//! ## Quick Start
//!
//! ```no_run
//! use imagegen_stream::{GenerationSession, JobRequest, SessionConfig};
//!
//! # async fn example() -> imagegen_stream::Result<()> {
//! let session = GenerationSession::new(SessionConfig::default())?;
//!
//! // Fill in the request from the server's catalog
//! let models = session.client().models().await?;
//! let request = JobRequest::new("a lighthouse at dusk, volumetric fog")
//!     .base_model(models[0].clone())
//!     .image_number(2);
//!
//! let summary = session.submit(&request).await?;
//! let state = session.snapshot();
//! println!("{} frames, {} images", summary.frames, state.gallery.len());
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod classifier;
pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod materializer;
pub mod observer;
pub mod parser;
pub mod request;
pub mod session;
pub mod state;
pub mod types;

pub use accumulator::ChunkAccumulator;
pub use classifier::{classify, Action};
pub use client::GenClient;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use decoder::FrameDecoder;
pub use error::{
    FrameDecodeError, GenError, MaterializationError, RecoveredError, Result,
    UnexpectedUpdateKind,
};
pub use materializer::{ImageMaterializer, PixelPayload, RawPixels};
pub use observer::{NoopObserver, PerfRecorder, Stage, StageObserver};
pub use parser::{parse_buffer, try_parse, ParseOutcome};
pub use request::{random_seed, JobRequest, LoraParameter, PerformanceMode};
pub use session::{GenerationSession, JobSummary};
pub use state::{GalleryOrder, JobProgressState, StateChange};
pub use types::{AspectRatio, DisplayImage, UpdateFrame, UpdateType};
