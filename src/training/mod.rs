pub mod corpus;
pub mod metrics;
pub mod trainer;

pub use corpus::{find_dataset, load_corpus, LabeledText};
pub use trainer::Trainer;
