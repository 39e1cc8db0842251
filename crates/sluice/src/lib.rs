//! Migration planning for MySQL and MariaDB.
//!
//! sluice turns an ordered list of schema [`Change`]s into a [`Plan`]: the
//! exact DDL statements to run, each with its reverse when one exists.
//!
//! ```
//! use sluice::schema::{Column, ColumnType, Index, Table};
//! use sluice::{Capabilities, Change, Planner};
//!
//! let user = Table::new("user")
//!     .with_column(Column::new("id", ColumnType::bigint()))
//!     .with_primary_key(Index::primary_key(["id"]));
//! let planner = Planner::new(Capabilities::default());
//! let plan = planner
//!     .plan("create_user", &[Change::AddTable { table: user, if_not_exists: false }])
//!     .unwrap();
//!
//! assert_eq!(
//!     plan.statements[0].forward,
//!     "CREATE TABLE `user` (`id` bigint NOT NULL, PRIMARY KEY (`id`))"
//! );
//! assert_eq!(plan.statements[0].reverse.as_deref(), Some("DROP TABLE `user`"));
//! assert!(plan.reversible);
//! ```
//!
//! # Plans are not transactional
//!
//! DDL statements commit implicitly on these engines, so a plan can never be
//! applied atomically. Run the statements in order; if one fails, the
//! statements before it have already taken effect.

mod capabilities;
mod change;
mod config;
mod error;
mod plan;
mod planner;
pub mod solver;

pub use capabilities::{Capabilities, ParseVersionError, Variant, Version};
pub use change::{Change, ChangeKind};
pub use config::{AutoIncrementPolicy, Config, PlanOptions};
pub use error::{ConfigError, Error, ErrorKind, Result};
pub use plan::{Plan, Statement};
pub use planner::Planner;
pub use solver::{ChangeOrdering, DefaultOrdering};

pub use sluice_schema as schema;
