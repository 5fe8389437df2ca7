//! The driver that walks a recording frame by frame and streams the result.
//!
//! Frames are analyzed and emitted strictly in time order. After each frame
//! that produced points the [StreamEmitter] pauses, and before each frame
//! the driver checks its [CancelToken]. With `threaded` set, analysis moves
//! to a [FrameAnalyzer] component on a worker thread, fed through bounded
//! channels so it never runs far ahead of the paced output. Emission stays
//! on the calling thread either way.

use crate::analysis::{AnalyzedFrame, FrameAnalyzer};
use crate::audio_buffer::AudioBuffer;
use crate::component::run_component;
use crate::config::{AnalysisConfig, ConfigError};
use crate::emitter::{StreamEmitter, Transport};
use crate::framer::Framer;
use crate::normalizer::normalize;
use crate::pacer::{CancelToken, Pacer};

use log::{debug, info, warn};
use std::sync::mpsc::sync_channel;
use std::thread;

/// Frames that may sit between stages in threaded mode.
const QUEUE_DEPTH: usize = 8;

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames the recording holds
    pub total_frames: usize,
    /// Frames that went through analysis
    pub frames_analyzed: usize,
    /// Frames that produced at least one point
    pub frames_emitted: usize,
    /// Points handed to the transport
    pub points_sent: usize,
    /// Points the transport rejected
    pub send_failures: usize,
    /// Whether the run was cut short
    pub cancelled: bool,
}

/// Owns the configuration, the emitter and the cancel flag for a run.
pub struct Pipeline<T: Transport> {
    config: AnalysisConfig,
    framer: Framer,
    emitter: StreamEmitter<T>,
    cancel: CancelToken,
}

impl<T: Transport> Pipeline<T> {
    /// Validates `config` and builds a pipeline sending through `transport`.
    pub fn new(config: AnalysisConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let framer = Framer::new(config.frame_size, config.hop_size)?;
        let emitter = StreamEmitter::new(transport, Pacer::new(config.frame_delay()));

        Ok(Self {
            config,
            framer,
            emitter,
            cancel: CancelToken::new(),
        })
    }

    /// Replaces the pipeline's cancel flag with a shared one.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that stops the run at the next frame boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Gives the transport back once the pipeline is done.
    pub fn into_transport(self) -> T {
        self.emitter.into_transport()
    }

    /// Normalizes the recording and streams every frame of it.
    pub fn run(&mut self, mut buffer: AudioBuffer) -> RunSummary {
        if let Some(peak) = normalize(&mut buffer) {
            info!("normalizing data (max value was {})", peak);
        }

        let total_frames = self.framer.num_frames(buffer.len());
        info!(
            "processing {} frames ({} samples at {}Hz, frame {} hop {})",
            total_frames,
            buffer.len(),
            buffer.sample_rate(),
            self.framer.frame_size(),
            self.framer.hop_size()
        );

        let mut summary = RunSummary {
            total_frames,
            ..RunSummary::default()
        };
        if self.config.threaded {
            self.run_threaded(&buffer, &mut summary);
        } else {
            self.run_sequential(&buffer, &mut summary);
        }

        info!(
            "finished processing file: {} of {} frames, {} points sent, {} send failures{}",
            summary.frames_analyzed,
            summary.total_frames,
            summary.points_sent,
            summary.send_failures,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        summary
    }

    fn run_sequential(&mut self, buffer: &AudioBuffer, summary: &mut RunSummary) {
        let mut analyzer = FrameAnalyzer::new(&self.config);

        for frame in self.framer.frames(buffer) {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let analyzed = analyzer.analyze(&frame);
            dispatch(&mut self.emitter, &self.config, buffer.sample_rate(), analyzed, summary);
        }
    }

    fn run_threaded(&mut self, buffer: &AudioBuffer, summary: &mut RunSummary) {
        let (frame_tx, frame_rx) = sync_channel(QUEUE_DEPTH);
        let (result_tx, result_rx) = sync_channel::<AnalyzedFrame>(QUEUE_DEPTH);
        let worker = run_component(FrameAnalyzer::new(&self.config), frame_rx, result_tx);

        let framer = &self.framer;
        let emitter = &mut self.emitter;
        let config = &self.config;
        let cancel = &self.cancel;

        thread::scope(|scope| {
            scope.spawn(move || {
                for frame in framer.frames(buffer) {
                    if frame_tx.send(frame).is_err() {
                        break;
                    }
                }
            });

            for analyzed in result_rx.iter() {
                if cancel.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }
                dispatch(emitter, config, buffer.sample_rate(), analyzed, summary);
            }
            // hanging up here unwinds the worker and the feeder
            drop(result_rx);
        });

        if worker.join().is_err() {
            warn!("analysis worker panicked");
        }
    }
}

/// Emits one analyzed frame, paces, and reports progress.
fn dispatch<T: Transport>(
    emitter: &mut StreamEmitter<T>,
    config: &AnalysisConfig,
    sample_rate: u32,
    analyzed: AnalyzedFrame,
    summary: &mut RunSummary,
) {
    summary.frames_analyzed += 1;
    let frame = analyzed.index;
    let reporting = frame % config.report_interval == 0;

    if !analyzed.ranked.is_empty() {
        let report = emitter.emit(&analyzed.ranked);
        summary.frames_emitted += 1;
        summary.points_sent += report.sent;
        summary.send_failures += report.failed;

        if reporting {
            if let Some(p) = analyzed.ranked.loudest() {
                debug!(
                    "sent point 0: pos=({:.2}, {:.2}, {:.2}), energy={:.2}",
                    p.x, p.y, p.z, p.energy
                );
            }
        }
        emitter.pace();
    }

    if reporting {
        let seconds = (frame * config.hop_size) as f64 / sample_rate as f64;
        info!(
            "processed frame {}/{} ({:.1}%) at {:.2}s",
            frame,
            summary.total_frames,
            frame as f64 / summary.total_frames as f64 * 100.0,
            seconds
        );
    }
}
