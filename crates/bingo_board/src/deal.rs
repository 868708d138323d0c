//! Card generation and rerolls.

use crate::{BoardError, BoardSize, Coord, Grid, PromptPool};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Attempts made by [`generate_distinct`] before giving up.
pub const MAX_DISTINCT_ATTEMPTS: usize = 64;

/// Draws N² distinct prompts from the pool in random order.
///
/// # Errors
///
/// Returns [`BoardError::PoolTooSmall`] if the pool holds fewer than N²
/// prompts.
#[instrument(skip(pool, rng), fields(pool = pool.len(), size = size.get()))]
pub fn generate<R: Rng + ?Sized>(
    pool: &PromptPool,
    size: BoardSize,
    rng: &mut R,
) -> Result<Vec<String>, BoardError> {
    let needed = size.cells();
    if pool.len() < needed {
        warn!(needed, "Prompt pool too small for board");
        return Err(BoardError::PoolTooSmall {
            needed,
            available: pool.len(),
        });
    }
    let mut prompts: Vec<String> = pool
        .as_slice()
        .choose_multiple(rng, needed)
        .cloned()
        .collect();
    prompts.shuffle(rng);
    Ok(prompts)
}

/// Generates a fresh unmarked card.
pub fn generate_card<R: Rng + ?Sized>(
    pool: &PromptPool,
    size: BoardSize,
    rng: &mut R,
) -> Result<Grid, BoardError> {
    Grid::new(size, generate(pool, size, rng)?)
}

/// Generates a card whose content differs from every card in `issued`.
///
/// # Errors
///
/// Returns [`BoardError::NoDistinctCard`] after [`MAX_DISTINCT_ATTEMPTS`]
/// collisions, or any error from [`generate`].
#[instrument(skip(pool, issued, rng), fields(issued = issued.len()))]
pub fn generate_distinct<R: Rng + ?Sized>(
    pool: &PromptPool,
    size: BoardSize,
    issued: &[&Grid],
    rng: &mut R,
) -> Result<Grid, BoardError> {
    for attempt in 1..=MAX_DISTINCT_ATTEMPTS {
        let card = generate_card(pool, size, rng)?;
        if !issued.iter().any(|other| other.same_prompts(&card)) {
            return Ok(card);
        }
        debug!(attempt, "Generated card collided with an issued card");
    }
    Err(BoardError::NoDistinctCard {
        attempts: MAX_DISTINCT_ATTEMPTS,
    })
}

/// Replaces prompts at `targets` with prompts not currently on the card.
///
/// Replaced cells come back unmarked. When the pool runs out of unused
/// prompts the remaining targets keep their prompt and mark. Returns the
/// coordinates actually replaced.
#[instrument(skip(grid, targets, pool, rng), fields(targets = targets.len()))]
pub fn reroll<R: Rng + ?Sized>(
    grid: &mut Grid,
    targets: &[Coord],
    pool: &PromptPool,
    rng: &mut R,
) -> Vec<Coord> {
    let on_card: HashSet<String> = grid.prompts().map(str::to_string).collect();
    let mut available: Vec<&String> = pool
        .as_slice()
        .iter()
        .filter(|prompt| !on_card.contains(prompt.as_str()))
        .collect();

    let mut replaced = Vec::with_capacity(targets.len());
    for &coord in targets {
        if replaced.contains(&coord) || !grid.size().contains(coord) {
            continue;
        }
        if available.is_empty() {
            warn!(
                left = targets.len() - replaced.len(),
                "Prompt pool exhausted, leaving remaining cells unchanged"
            );
            break;
        }
        let prompt = available.swap_remove(rng.gen_range(0..available.len()));
        grid.replace(coord, prompt.clone());
        replaced.push(coord);
    }
    debug!(replaced = replaced.len(), "Reroll complete");
    replaced
}
