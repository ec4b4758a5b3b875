//! Engine module: CLI, source, classifier, and result log operations

pub mod arg_parser;
pub mod classifier;
pub mod cli;
pub mod log_ops;
pub mod progress;
pub mod source;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::{Cli, Commands};
pub use classifier::{Classify, UrlClassifier, classify_error, classify_response, client_builder};
pub use cli::handle_run;
pub use log_ops::{LogError, ResultCache, ResultSink, SkipSet, load_skip_set};
pub use source::{fetch_entities, load_entities, parse_entities, read_entities};
pub use tools::normalized_hostname;
