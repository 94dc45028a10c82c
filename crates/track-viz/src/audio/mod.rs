mod decode;
mod output;

pub use decode::load_waveform;
pub use output::{CpalDevice, Output};
