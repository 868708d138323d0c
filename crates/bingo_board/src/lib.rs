//! Bingo board logic - card model, win evaluation, and prompt dealing.
//!
//! Everything in this crate is synchronous and free of I/O so that the
//! session engine can call it while holding a session lock.
//!
//! # Architecture
//!
//! - **Grid**: an N×N card of prompts with per-cell marks, plus the
//!   per-player [`MarkSet`] used on a shared card
//! - **Rules**: named win conditions and the pure [`evaluate`] function
//! - **Pool**: de-duplicated prompt pools and the grouped [`PromptCatalog`]
//! - **Deal**: card generation and [`reroll`] of a [`RegionSelector`]
//!
//! # Example
//!
//! ```
//! use bingo_board::{evaluate, generate_card, BoardSize, Coord, PromptPool, Rule, RuleSet};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let size = BoardSize::default();
//! let mut card = generate_card(&PromptPool::builtin(), size, &mut rng).unwrap();
//! for col in 0..size.get() {
//!     card.toggle_mark(Coord::new(2, col));
//! }
//! let check = evaluate(&card.marks(), size, &RuleSet::from_iter([Rule::OneRow]));
//! assert_eq!(check.rule, Some(Rule::OneRow));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod deal;
mod defaults;
mod error;
mod grid;
mod pool;
mod position;
mod region;
mod rules;

pub use deal::{MAX_DISTINCT_ATTEMPTS, generate, generate_card, generate_distinct, reroll};
pub use error::BoardError;
pub use grid::{Cell, Grid, MarkSet, SharedMark};
pub use pool::{CatalogGroups, MIN_POOL_SIZE, PoolGroup, PromptCatalog, PromptEntry, PromptPool};
pub use position::{BoardSize, Coord, DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
pub use region::{Diagonal, RegionRequest, RegionSelector};
pub use rules::{Rule, RuleSet, WinCheck, evaluate, most_marked_winner};
