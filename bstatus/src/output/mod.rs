//! Status-line outputs.
//!
//! - [`StandardOutput`] - a single terminal line, or one line per render
//!   when standard output is not a terminal
//! - [`I3BarOutput`] - the i3bar JSON protocol with click events

mod i3bar;
mod standard;

pub use i3bar::{ClickEvent, I3BarOutput, parse_click, read_clicks};
pub use standard::StandardOutput;

use bstatus_framework::Output;

use crate::config::OutputConfig;

/// Build the output selected by the configuration, writing to stdout.
pub fn from_config(config: &OutputConfig) -> Box<dyn Output> {
    match config {
        OutputConfig::Standard => Box::new(StandardOutput::stdout()),
        OutputConfig::I3bar { separator_width } => {
            Box::new(I3BarOutput::stdout().with_separator_width(*separator_width))
        }
    }
}
