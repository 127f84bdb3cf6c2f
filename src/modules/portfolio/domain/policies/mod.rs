pub mod mutation_policy;

pub use mutation_policy::{EntityKind, MutationPolicy};
