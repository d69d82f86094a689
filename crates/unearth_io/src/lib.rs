mod sink;
mod source;

pub use sink::{CopyMode, DirectorySink};
pub use source::MappedSource;
