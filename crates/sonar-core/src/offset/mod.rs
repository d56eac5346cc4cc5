mod collection;
mod loader;
mod searcher;
mod signature;

pub use collection::*;
pub use loader::*;
pub use searcher::*;
pub use signature::*;
