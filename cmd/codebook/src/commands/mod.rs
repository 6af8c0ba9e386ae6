//! CLI commands module.

mod info;
mod quantize;
mod train;
mod util;

pub use info::InfoCommand;
pub use quantize::QuantizeCommand;
pub use train::TrainCommand;

pub(crate) use util::*;
