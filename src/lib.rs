//! Pointillism turns a first-order Ambisonic (B-format) recording into a
//! stream of sound-source directions. Each short-time frame of the W, X, Y
//! and Z channels is transformed to the frequency domain, every frequency
//! bin yields a candidate direction of arrival, and the loudest candidates
//! are sent out as OSC messages (`/point/<rank>`) at a steady cadence so a
//! visualizer can draw them as a cloud of points.
//!
//! The processing chain, in order:
//!
//! 1. [ingest] decodes a WAV/AMB file into an [audio_buffer::AudioBuffer]
//! 2. [normalizer] bounds the peak amplitude
//! 3. [framer] slices Hann-windowed frames
//! 4. [spectral] takes the one-sided FFT of each channel
//! 5. [estimator] derives a unit direction and an energy per bin
//! 6. [ranker] keeps the loudest `num_points` estimates
//! 7. [emitter] sends them over UDP, paced by [pacer]
//!
//! [pipeline] drives all of the above. The [receiver] module is the other
//! end of the wire and backs the `monitor` binary.

#![warn(missing_docs)]
pub mod analysis;
pub mod args;
pub mod audio_buffer;
pub mod component;
pub mod config;
pub mod emitter;
pub mod error;
pub mod estimator;
pub mod framer;
pub mod ingest;
pub mod normalizer;
pub mod pacer;
pub mod pipeline;
pub mod ranker;
pub mod receiver;
pub mod spectral;
pub mod synth;
