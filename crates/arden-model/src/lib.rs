#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ardenquant/arden/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod error;
pub mod instrument;
pub mod position;
pub mod sector;
pub mod series;
pub mod snapshot;

pub use builder::{AlignmentReport, ReturnSeriesBuilder};
pub use error::{ModelError, SeriesError};
pub use instrument::{AssetClass, Instrument};
pub use position::Position;
pub use sector::Sector;
pub use series::{Frequency, PriceSeries, ReturnSeries};
pub use snapshot::PortfolioSnapshot;
