#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ardenquant/arden/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frontier;
pub mod markowitz;
pub mod rebalance;
pub mod solver;

pub use error::OptimizeError;
pub use frontier::{FrontierPoint, efficient_frontier};
pub use markowitz::{
    Constraints, Objective, OptimizationResult, SectorCap, mean_variance_optimize,
};
pub use rebalance::{RebalanceConfig, RebalanceResult, Trade, rebalance};
pub use solver::{
    GroupCap, ProjectedGradientSolver, QpProblem, Solution, Solver, SolverConfig, SolverError,
};
