//! Scan session orchestration for roomscan
//!
//! [`ScanProcessor`] validates a batch of posed RGB-D frames, fuses them into
//! one cloud, extracts room planes, junctions, dimensions and coverage,
//! classifies openings and enclosure faces, scores the scan and keeps the
//! latest result per session for [`ScanProcessor::finalize`].

pub mod config;
pub mod error;
pub mod processor;
pub mod quality;
pub mod result;
pub mod session;

pub use config::*;
pub use error::*;
pub use processor::*;
pub use quality::*;
pub use result::*;
pub use session::*;

// Records that appear in scan results
pub use roomscan_algorithms::{CoverageData, Dimensions, Junction, JunctionType, MissingZone, VerticalLine, WebLine};
pub use roomscan_classify::{ClassifierSelection, FramePlane, HeuristicReason, OpeningType, Reveal};
pub use roomscan_core::TrajectoryPoint;
