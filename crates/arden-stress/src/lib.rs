#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ardenquant/arden/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod scenario;

pub use engine::{PositionImpact, StressError, StressTestResult, apply_scenario};
pub use scenario::StressScenario;
