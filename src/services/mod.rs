pub mod classifier;
pub mod domain_searcher;
pub mod droid;
pub mod extractor;
pub mod navigator;
pub mod processor;
pub mod sanitizer;
#[cfg(test)]
pub mod test_support;
pub mod trace;
pub mod transport;

pub use classifier::*;
pub use domain_searcher::*;
pub use droid::*;
pub use extractor::*;
pub use navigator::*;
pub use processor::*;
pub use sanitizer::*;
pub use trace::*;
pub use transport::*;
