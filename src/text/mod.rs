pub mod lexicon;
pub mod normalizer;

pub use normalizer::{CanonicalText, Normalizer};
