#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ardenquant/arden/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod brinson;
pub mod error;
pub mod linking;

pub use brinson::{AttributionResult, SectorAttribution, SectorObservation, attribute};
pub use error::AttributionError;
pub use linking::{LinkedAttribution, link_periods};
