//! Course scheduling for Splash-style enrichment programs.
//!
//! Given teachers with availability, rooms with capacities and features, and
//! course sections needing a contiguous run of periods, searches for a
//! room/period placement of every section that breaks no hard rule and
//! maximizes a configurable score.
//!
//! # Modules
//!
//! - **`models`**: Program entities, `ProgramGraph`, placements, and the
//!   persistent `Schedule`
//! - **`persistent`**: `PersistentMap`, the immutable ordered map schedules
//!   are built from
//! - **`validation`**: Program integrity checks (dangling ids, cycles)
//! - **`logic`**: Conflict rules, the rule chain, and `ScheduleValidator`
//! - **`optimizer`**: Simulated annealing, single-threaded and round-based
//!   parallel
//! - **`scoring`**: Schedule metrics and weighted composite scorers
//! - **`perturbation`**: Neighbor moves over schedules
//! - **`config`**: JSON optimizer and rule-chain configuration
//! - **`scheduler`**: End-to-end driver
//!
//! # Architecture
//!
//! Schedules are immutable values. Every update returns a new schedule that
//! shares untouched structure with the old one, so optimizer threads pass
//! them around freely. Conflicts are data, never errors: an update reports
//! what it collided with through a `ScheduleValidator`.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Okasaki (1998), "Purely Functional Data Structures"
//! - Seidel & Aragon (1996), "Randomized Search Trees"

pub mod config;
pub mod error;
pub mod logic;
pub mod models;
pub mod optimizer;
pub mod persistent;
pub mod perturbation;
pub mod scheduler;
pub mod scoring;
pub mod validation;

pub use error::{ConfigError, Error, GraphIntegrityError, Result, ScheduleError};
