//! Classifier selection with typed fallback

use crate::classifier::{HeuristicClassifier, PlaneClassifier};
use crate::trained::{TrainedClassifier, META_FILE};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Model directory probed when none is configured
pub const DEFAULT_MODEL_DIR: &str = "models/plane-classifier";

/// Why the heuristic classifier is in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeuristicReason {
    NoModelConfigured,
    ModelNotFound { dir: PathBuf },
    LoadFailed { dir: PathBuf, message: String },
}

impl fmt::Display for HeuristicReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeuristicReason::NoModelConfigured => write!(f, "no model configured"),
            HeuristicReason::ModelNotFound { dir } => write!(f, "no model in {}", dir.display()),
            HeuristicReason::LoadFailed { dir, message } => {
                write!(f, "failed to load model from {}: {message}", dir.display())
            }
        }
    }
}

/// The classifier chosen for a processor, and how it was chosen
#[derive(Clone)]
pub enum ClassifierSelection {
    /// Supplied by the caller
    Explicit(Arc<dyn PlaneClassifier>),
    Trained(Arc<TrainedClassifier>),
    Heuristic { reason: HeuristicReason },
}

impl ClassifierSelection {
    pub fn explicit(classifier: Arc<dyn PlaneClassifier>) -> Self {
        ClassifierSelection::Explicit(classifier)
    }

    pub fn classifier(&self) -> Arc<dyn PlaneClassifier> {
        match self {
            ClassifierSelection::Explicit(classifier) => Arc::clone(classifier),
            ClassifierSelection::Trained(model) => Arc::clone(model) as Arc<dyn PlaneClassifier>,
            ClassifierSelection::Heuristic { .. } => Arc::new(HeuristicClassifier::new()),
        }
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, ClassifierSelection::Heuristic { .. })
    }
}

impl fmt::Debug for ClassifierSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierSelection::Explicit(classifier) => {
                f.debug_tuple("Explicit").field(&classifier.name()).finish()
            }
            ClassifierSelection::Trained(model) => f
                .debug_struct("Trained")
                .field("trees", &model.tree_count())
                .finish(),
            ClassifierSelection::Heuristic { reason } => {
                f.debug_struct("Heuristic").field("reason", reason).finish()
            }
        }
    }
}

/// Choose a classifier: the configured model directory, then the default
/// directory if it holds a model, then the heuristic rules.
///
/// Load failures are logged and recorded in the returned selection; they are
/// never errors.
pub fn load_classifier(model_dir: Option<&Path>, default_dir: Option<&Path>) -> ClassifierSelection {
    if let Some(dir) = model_dir {
        return try_load(dir);
    }

    match default_dir {
        Some(dir) if dir.join(META_FILE).is_file() => try_load(dir),
        Some(dir) => {
            debug!(dir = %dir.display(), "no default model, using heuristic classifier");
            ClassifierSelection::Heuristic {
                reason: HeuristicReason::NoModelConfigured,
            }
        }
        None => ClassifierSelection::Heuristic {
            reason: HeuristicReason::NoModelConfigured,
        },
    }
}

fn try_load(dir: &Path) -> ClassifierSelection {
    if !dir.join(META_FILE).is_file() {
        warn!(dir = %dir.display(), "model directory has no {META_FILE}, using heuristic classifier");
        return ClassifierSelection::Heuristic {
            reason: HeuristicReason::ModelNotFound { dir: dir.to_path_buf() },
        };
    }

    match TrainedClassifier::load(dir) {
        Ok(model) => {
            debug!(dir = %dir.display(), trees = model.tree_count(), "loaded plane classifier");
            ClassifierSelection::Trained(Arc::new(model))
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to load plane classifier, using heuristic");
            ClassifierSelection::Heuristic {
                reason: HeuristicReason::LoadFailed {
                    dir: dir.to_path_buf(),
                    message: e.to_string(),
                },
            }
        }
    }
}
