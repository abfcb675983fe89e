#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Courier Core
//!
//! Core of an actor-based asynchronous job execution framework: producers
//! enqueue messages addressed to named actors, pluggable transports carry
//! them to workers, and an ordered middleware pipeline observes and
//! influences every stage of a job's life without touching actor code.
//!
//! ## Architecture
//!
//! The crate centers on the **middleware hook contract** and the
//! **lifecycle state machine** it drives:
//!
//! - [`middleware`] - the fixed hook catalog and the three-level option
//!   resolution cascade (message, actor, middleware defaults)
//! - [`broker`] - the hook dispatcher; owns the ordered middleware list,
//!   the actor registry and the injected backend handles
//! - [`state`] - lifecycle snapshots, the TTL-bearing state store
//!   contract with in-memory and Postgres backends, the reference state
//!   tracking middleware, and group aggregation
//! - [`results`] - bounded-size, failure-classified result retrieval
//! - [`cancel`] / [`scheduler`] - cooperative cancellation intent and the
//!   optional scheduler handle
//! - [`composition`] - pipeline and group builders over the reserved
//!   `pipe_target` / `group_info` options
//! - [`web`] - the operational HTTP surface: list/filter/paginate state,
//!   cancel, requeue, fetch results, inspect actors and groups
//!
//! Transports, worker pools, rate limiter algorithms and result storage
//! engines are external collaborators; only their call contracts appear
//! here.
//!
//! ## Concurrency model
//!
//! Hooks for a single message's single lifecycle event run sequentially,
//! in registration order, on the calling task. Different messages may be
//! processed concurrently; state writes to the same message id are
//! last-write-wins on the store's single-key atomicity.

pub mod actor;
pub mod broker;
pub mod cancel;
pub mod composition;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod middleware;
pub mod results;
pub mod scheduler;
pub mod state;
pub mod web;

pub use actor::{Actor, ActorError, ActorHandler};
pub use broker::{AttemptOutcome, Broker, BrokerBuilder};
pub use cancel::{CancelBackend, InMemoryCancelBackend};
pub use config::CourierConfig;
pub use error::{CourierError, Result};
pub use message::{GroupInfo, Message, OptionsMap, GROUP_INFO, PIPE_TARGET};
pub use middleware::{BeforeProcessFlow, Middleware, ProcessOutcome};
pub use results::{EncodedResult, InMemoryResultBackend, ResultBackend};
pub use scheduler::{LocalScheduler, ScheduledJob, Scheduler};
pub use state::backends::{InMemoryStateStore, PostgresStateStore};
pub use state::filter::StateFilter;
pub use state::middleware::MessageStateMiddleware;
pub use state::store::StateStore;
pub use state::{State, StateStatus};
