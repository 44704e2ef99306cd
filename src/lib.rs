pub mod chart;
pub mod combiner;
pub mod config;
pub mod dependency;
pub mod driver;
pub mod features;
pub mod pruning;
pub mod rule_engine;
pub mod scorer;
pub mod sentence;
pub mod skimmer;
pub mod supercat;
pub mod unary;
pub mod weights;

/// Boxed, dynamically-typed error, used for configuration and collaborator
/// I/O failures (spec.md §7) — not for structural violations, which are
/// `panic!`s. Grounded on `treebender::Err`.
pub type Err = Box<dyn std::error::Error + 'static>;
