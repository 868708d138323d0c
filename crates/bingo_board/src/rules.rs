//! Win conditions and board evaluation.

use crate::BoardSize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, instrument};

/// A named win condition.
///
/// Declaration order is evaluation priority.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    AsRefStr,
)]
pub enum Rule {
    /// Any one complete row.
    #[serde(rename = "row")]
    #[strum(serialize = "row")]
    OneRow,
    /// Any two complete rows.
    #[serde(rename = "2rows")]
    #[strum(serialize = "2rows")]
    TwoRows,
    /// Any three complete rows.
    #[serde(rename = "3rows")]
    #[strum(serialize = "3rows")]
    ThreeRows,
    /// Any one complete column.
    #[serde(rename = "column")]
    #[strum(serialize = "column")]
    OneColumn,
    /// Any two complete columns.
    #[serde(rename = "2columns")]
    #[strum(serialize = "2columns")]
    TwoColumns,
    /// Any three complete columns.
    #[serde(rename = "3columns")]
    #[strum(serialize = "3columns")]
    ThreeColumns,
    /// Either full diagonal.
    #[serde(rename = "diagonals")]
    #[strum(serialize = "diagonals")]
    Diagonal,
    /// Every cell marked.
    #[serde(rename = "full")]
    #[strum(serialize = "full")]
    FullBoard,
    /// Most cells held when the timer runs out or the shared card fills.
    #[serde(rename = "most_squares")]
    #[strum(serialize = "most_squares")]
    MostMarked,
}

impl Rule {
    /// Label announced with a win.
    pub fn label(self) -> &'static str {
        match self {
            Self::OneRow => "Row",
            Self::TwoRows => "2 Rows",
            Self::ThreeRows => "3 Rows",
            Self::OneColumn => "Column",
            Self::TwoColumns => "2 Columns",
            Self::ThreeColumns => "3 Columns",
            Self::Diagonal => "Diagonals",
            Self::FullBoard => "Full Card",
            Self::MostMarked => "Most Squares",
        }
    }

    /// Whether [`evaluate`] can fire this rule from a single board.
    pub fn is_line_rule(self) -> bool {
        self != Self::MostMarked
    }
}

/// The set of rules enabled for a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(BTreeSet<Rule>);

impl RuleSet {
    /// Parses wire rule names, dropping any name that is not a rule.
    #[instrument(skip(names))]
    pub fn parse_lenient<S: AsRef<str>>(names: &[S]) -> Self {
        names
            .iter()
            .filter_map(|name| {
                let parsed = name.as_ref().trim().parse::<Rule>().ok();
                if parsed.is_none() {
                    debug!(name = name.as_ref(), "Dropping unknown rule");
                }
                parsed
            })
            .collect()
    }

    /// Whether the rule is enabled.
    pub fn contains(&self, rule: Rule) -> bool {
        self.0.contains(&rule)
    }

    /// Whether no rule is enabled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Enabled rules in priority order.
    pub fn iter(&self) -> impl Iterator<Item = Rule> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of evaluating one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinCheck {
    /// Whether any enabled rule is satisfied.
    pub won: bool,
    /// First satisfied rule in priority order.
    pub rule: Option<Rule>,
}

impl WinCheck {
    const NONE: Self = Self {
        won: false,
        rule: None,
    };
}

/// Evaluates a boolean mark matrix against the enabled rules.
///
/// Missing rows and short rows count as unmarked, so a malformed matrix can
/// never produce a win it does not contain. [`Rule::MostMarked`] is never
/// returned here since it compares players rather than lines.
#[instrument(skip(marks, rules), fields(size = size.get()))]
pub fn evaluate(marks: &[Vec<bool>], size: BoardSize, rules: &RuleSet) -> WinCheck {
    let n = size.get();
    let at = |row: usize, col: usize| {
        marks
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    };

    let rows = (0..n).filter(|&r| (0..n).all(|c| at(r, c))).count();
    let cols = (0..n).filter(|&c| (0..n).all(|r| at(r, c))).count();
    let main = (0..n).all(|i| at(i, i));
    let anti = (0..n).all(|i| at(i, n - 1 - i));
    let full = rows == n;

    let fired = Rule::iter().filter(|rule| rules.contains(*rule)).find(|rule| match rule {
        Rule::OneRow => rows >= 1,
        Rule::TwoRows => rows >= 2,
        Rule::ThreeRows => rows >= 3,
        Rule::OneColumn => cols >= 1,
        Rule::TwoColumns => cols >= 2,
        Rule::ThreeColumns => cols >= 3,
        Rule::Diagonal => main || anti,
        Rule::FullBoard => full,
        Rule::MostMarked => false,
    });

    match fired {
        Some(rule) => {
            debug!(rule = rule.as_ref(), rows, cols, "Win condition met");
            WinCheck {
                won: true,
                rule: Some(rule),
            }
        }
        None => WinCheck::NONE,
    }
}

/// Picks the single player holding strictly more cells than anyone else.
///
/// Ties for the top count, or nobody holding anything, yield `None`.
pub fn most_marked_winner<K>(counts: impl IntoIterator<Item = (K, usize)>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    let mut tied = false;
    for (key, count) in counts {
        let top = best.as_ref().map(|(_, top)| *top);
        match top {
            Some(top) if count < top => {}
            Some(top) if count == top => tied = true,
            _ => {
                best = Some((key, count));
                tied = false;
            }
        }
    }
    match best {
        Some((key, count)) if count > 0 && !tied => Some(key),
        _ => None,
    }
}
