#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Stepseq
//!
//! Sequential batch pipeline engine and lazy LINQ-style query engine over
//! dynamic values.
//!
//! ## Overview
//!
//! Stepseq combines two interacting subsystems:
//!
//! - **The batch engine** ([`batch`]): an ordered pipeline of operations
//!   with lifecycle hooks, executed sequentially with shared mutable state,
//!   value forwarding between steps, skip directives, cooperative
//!   cancellation and finish tracking.
//! - **The query engine** ([`query`]): a pull-based cursor over dynamic
//!   values with a library of LINQ-shaped operators. `select` is lazy;
//!   everything else drains the source and materializes.
//!
//! Callback parameters throughout accept either native closures or
//! arrow-lambda strings such as `"(x, y) => x + y"`, compiled by the
//! sandboxed expression interpreter in [`lambda`]. No runtime code
//! evaluation is involved.
//!
//! ## Module Organization
//!
//! - [`value`] - Dynamic value model and shared-state handles
//! - [`lambda`] - Arrow-lambda parsing and callback invocation
//! - [`query`] - Sequences, cursors, ordering and grouping
//! - [`batch`] - The batch pipeline and its lifecycle state machine
//! - [`config`] - Engine defaults, overridable from the environment
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging initialization
//!
//! ## Quick Start
//!
//! ```rust
//! use stepseq::batch::new_batch;
//! use stepseq::query;
//! use stepseq::value::Value;
//!
//! # fn example() -> stepseq::error::Result<()> {
//! // A two-step pipeline threading a value between steps
//! let mut batch = new_batch(|ctx| {
//!     ctx.next_value = Value::Int(21);
//!     Ok(())
//! })
//! .next(|ctx| {
//!     let doubled = ctx.prev_value.multiply(&Value::Int(2))?;
//!     ctx.set_result_and_value(doubled);
//!     Ok(())
//! });
//! assert_eq!(batch.start()?, Value::Int(42));
//!
//! // A query over an array with a string lambda
//! let seq = query::from_array(vec![1.into(), 2.into(), 3.into()]);
//! let mut evens = seq.where_(stepseq::lambda::Callback::parse("x => x % 2 == 0")?)?;
//! assert_eq!(evens.to_array()?, vec![Value::Int(2)]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod lambda;
pub mod logging;
pub mod query;
pub mod value;

pub use batch::{new_batch, Batch, ExecutionPhase, InvokeStrategy, OperationContext};
pub use config::EngineConfig;
pub use error::{Result, StepseqError};
pub use lambda::{as_func, Callback, ItemContext};
pub use query::{as_enumerable, from_array, from_object, is_enumerable, Sequence};
pub use value::{Observable, ObservableArray, Value};
