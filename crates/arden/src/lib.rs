#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ardenquant/arden/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use arden_attribution as attribution;
pub use arden_model as model;
pub use arden_optimize as optimize;
pub use arden_risk as risk;
pub use arden_stress as stress;

pub mod contracts;
pub mod error;
pub mod provider;
pub mod service;

pub use error::ArdenError;
pub use provider::{
    InMemoryMarketData, InMemorySnapshots, MarketDataProvider, ProviderError, SnapshotProvider,
};
pub use service::AnalyticsService;
