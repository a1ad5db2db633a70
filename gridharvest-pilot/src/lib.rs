//! Per-tick coordination engine for a resource-harvesting unit swarm, plus
//! the lab harness that runs it closed-loop against a local host.
//!
//! One [`engine::Pilot`] owns one player's units. Each tick it produces
//! exactly one movement intent per unit: economically sound (stay-and-harvest
//! versus move, with stochastic patience), collision-free against friendly
//! units, evasive toward hostiles, and consistent with a shared contended
//! target map. Greedy and bounded by design; never an optimal solver.

pub mod assign;
pub mod benchmark;
pub mod cost;
pub mod engine;
pub mod host;
pub mod ledger;
pub mod lifecycle;
pub mod planner;
pub mod resolve;
pub mod runner;
pub mod util;
