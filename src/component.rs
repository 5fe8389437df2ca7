//! Defines the Component trait, the common shape of a Pointillism
//! processing stage: it consumes one item from the preceding stage, turns
//! it into one item for the next, and can run on a thread of its own
//! between two channels.

use log::{info, warn};
use std::fmt;
use std::sync::mpsc::{Receiver, SyncSender};
use std::thread::{self, JoinHandle};

/// Problems a stage reports when it shuts down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// The spectral transform failed on this many frames.
    TransformFailures(usize),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentError::TransformFailures(n) => {
                write!(f, "spectral transform failed on {} frames", n)
            }
        }
    }
}

impl std::error::Error for ComponentError {}

///
/// A stage in the Pointillism pipeline. Anything that performs a step of
/// the analysis implements Component so that it can be driven inline or
/// moved onto a worker with [run_component].
///
pub trait Component: fmt::Display {
    /// What the stage consumes
    type InData;
    /// What the stage produces
    type OutData;

    /// Converts one input into one output
    fn convert(&mut self, input: Self::InData) -> Self::OutData;

    /// Cleans up at termination of the pipeline
    fn finalize(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Runs the given Component on its own thread. Every item received on
/// `input` is converted and sent to `output`, in order. The thread ends when
/// the input side hangs up or the output side stops listening.
pub fn run_component<C>(
    mut component: C,
    input: Receiver<C::InData>,
    output: SyncSender<C::OutData>,
) -> JoinHandle<()>
where
    C: Component + Send + 'static,
    C::InData: Send + 'static,
    C::OutData: Send + 'static,
{
    thread::spawn(move || {
        while let Ok(data) = input.recv() {
            let out_data = component.convert(data);
            if output.send(out_data).is_err() {
                info!("{} : downstream closed, stopping early.", component);
                break;
            }
        }

        if let Err(component_error) = component.finalize() {
            warn!("{} : error during terminating : {}.", component, component_error);
        }
        info!("{} : terminated.", component);
    })
}
