pub mod artifact;
pub mod bayes;
pub mod classifier;
pub mod decision;
mod engine;
pub mod logistic;
pub mod svm;
pub mod vectorizer;

pub use artifact::{load_model, save_model, ArtifactError, TrainedModel};
pub use classifier::{ClassifierModel, ModelKind, SpamScorer};
pub use decision::{decide, DEFAULT_THRESHOLD};
pub use engine::SpamClassifier;
pub use vectorizer::{FeatureVector, Vectorizer, DEFAULT_MAX_FEATURES};
