//! Classroom placement framework for the U-Engine ecosystem.
//!
//! Partitions a grade's roster into a fixed number of classes while
//! honoring grouping constraints and balancing gender, academic level,
//! behavioral level, and special-education load. Finished classes can be
//! reviewed with swap/move suggestions and paired with teachers by
//! compatibility.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Student`, `Level`, `Constraint`,
//!   `ClassBucket`, `TeacherProfile`
//! - **`validation`**: Input integrity checks (class count, duplicate IDs,
//!   unknown references, teacher profiles, weights)
//! - **`resolver`**: Normalizes constraints into together groups,
//!   separation sets, teacher preferences, and balance emphasis
//! - **`balance`**: Per-class balance scoring
//! - **`placement`**: Placement engine and strategies
//! - **`suggestions`**: Swap/move proposals for imbalanced class pairs
//! - **`matching`**: Teacher–class compatibility and assignment
//! - **`source`**: Injected data access (`RosterSource`)
//! - **`planner`**: `ClassPlanner` facade over the above
//! - **`config`**: TOML-loadable `PlannerConfig`
//!
//! # Pipeline
//!
//! ```text
//! constraints ──> resolver ──> placement ──> balance ──> suggestions
//!                                   │
//!                                   └──> matching (teachers)
//! ```
//!
//! Every run is a pure function of its input snapshot. The library logs
//! through `tracing` and never installs a subscriber.

pub mod balance;
pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod placement;
pub mod planner;
pub mod resolver;
pub mod source;
pub mod suggestions;
pub mod validation;

pub use config::{ConfigError, PlannerConfig};
pub use error::{PlacementError, Result};
pub use planner::{ClassPlanner, GradePlan, PlacementResult};
