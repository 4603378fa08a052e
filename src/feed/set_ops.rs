//! Set algebra over feeds.
//!
//! Every operation funnels into [`combine`], which indexes its operands and
//! either answers a question about their id sets or materializes a new
//! [`Feed`]. The named methods and operator impls on `Feed` are thin
//! bindings onto the same dispatcher.

use std::cmp::Ordering;
use std::ops::{BitAnd, BitOr, BitXor, Sub};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::feed::index::EntryIndex;
use crate::feed::model::{Entry, Feed, FeedError};
use crate::util::{fresh_urn, utc_now};

/// Author recorded on every feed produced by a set operation.
pub const AUTHOR: &str = "feedset";

/// The operations a feed supports as a set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SetOp {
    Union,
    Intersection,
    Difference,
    #[value(name = "symmetric_difference", alias = "symmetric-difference")]
    SymmetricDifference,
    #[value(name = "isdisjoint")]
    IsDisjoint,
    #[value(name = "issubset")]
    IsSubset,
    #[value(name = "issuperset")]
    IsSuperset,
    Len,
    Lt,
    Le,
    Gt,
    Ge,
}

impl SetOp {
    pub fn name(self) -> &'static str {
        match self {
            SetOp::Union => "union",
            SetOp::Intersection => "intersection",
            SetOp::Difference => "difference",
            SetOp::SymmetricDifference => "symmetric_difference",
            SetOp::IsDisjoint => "isdisjoint",
            SetOp::IsSubset => "issubset",
            SetOp::IsSuperset => "issuperset",
            SetOp::Len => "len",
            SetOp::Lt => "lt",
            SetOp::Le => "le",
            SetOp::Gt => "gt",
            SetOp::Ge => "ge",
        }
    }

    /// Whether the operation produces a new feed.
    pub fn is_set_valued(self) -> bool {
        matches!(
            self,
            SetOp::Union | SetOp::Intersection | SetOp::Difference | SetOp::SymmetricDifference
        )
    }

    /// Whether a single id belongs to the result, given every operand's index.
    fn admits(self, id: &str, indexes: &[&EntryIndex]) -> bool {
        match self {
            SetOp::Union => true,
            SetOp::Intersection => indexes.iter().all(|index| index.contains(id)),
            SetOp::Difference => match indexes.split_first() {
                Some((first, rest)) => {
                    first.contains(id) && !rest.iter().any(|index| index.contains(id))
                }
                None => false,
            },
            SetOp::SymmetricDifference => {
                indexes.iter().filter(|index| index.contains(id)).count() == 1
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for SetOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a set operation evaluates to.
#[derive(Debug)]
pub enum SetOutcome {
    Feed(Feed),
    Bool(bool),
    Count(usize),
}

/// Applies `op` to `feeds`, in argument order.
///
/// # Errors
///
/// Returns [`FeedError::Argument`] when no feed is given, when `len` gets
/// anything but one feed, or when a comparison gets anything but two.
pub fn combine(op: SetOp, feeds: &[&Feed]) -> Result<SetOutcome, FeedError> {
    if feeds.is_empty() {
        return Err(FeedError::Argument(format!(
            "{} requires at least one feed",
            op.name()
        )));
    }

    let indexes: Vec<&EntryIndex> = feeds.iter().map(|feed| feed.ensure_index()).collect();

    let outcome = match (op, indexes.as_slice()) {
        (SetOp::Len, [a]) => SetOutcome::Count(a.len()),
        (SetOp::IsDisjoint, [a, b]) => SetOutcome::Bool(a.is_disjoint(b)),
        (SetOp::IsSubset | SetOp::Le, [a, b]) => SetOutcome::Bool(a.is_subset(b)),
        (SetOp::IsSuperset | SetOp::Ge, [a, b]) => SetOutcome::Bool(b.is_subset(a)),
        (SetOp::Lt, [a, b]) => SetOutcome::Bool(a.len() < b.len() && a.is_subset(b)),
        (SetOp::Gt, [a, b]) => SetOutcome::Bool(a.len() > b.len() && b.is_subset(a)),
        (op, _) if op.is_set_valued() => SetOutcome::Feed(materialize(op, feeds, &indexes)),
        (op, operands) => {
            let expected = if op == SetOp::Len { 1 } else { 2 };
            return Err(FeedError::Argument(format!(
                "{} takes exactly {} feed(s), {} given",
                op.name(),
                expected,
                operands.len()
            )));
        }
    };

    Ok(outcome)
}

/// Builds the result feed of a set-valued operation.
///
/// Entries are gathered into one map in operand order; an id seen again in a
/// later operand takes that operand's entry but keeps its first position.
fn materialize(op: SetOp, feeds: &[&Feed], indexes: &[&EntryIndex]) -> Feed {
    let mut unified: IndexMap<&str, &Arc<Entry>> = IndexMap::new();
    for index in indexes {
        for (id, entry) in index.iter() {
            unified.insert(id, entry);
        }
    }

    let entries: Vec<Arc<Entry>> = unified
        .into_iter()
        .filter(|(id, _)| op.admits(id, indexes))
        .map(|(_, entry)| Arc::clone(entry))
        .collect();

    let separator = format!(" {} ", op.name());
    let title = feeds
        .iter()
        .map(|feed| feed.title())
        .collect::<Vec<_>>()
        .join(&separator);

    tracing::debug!(
        op = op.name(),
        operands = feeds.len(),
        entries = entries.len(),
        "Materialized set operation"
    );

    derived_feed(title, entries)
}

fn derived_feed(title: String, entries: Vec<Arc<Entry>>) -> Feed {
    Feed::assemble(
        fresh_urn(),
        title,
        Some(utc_now()),
        Some(AUTHOR.to_string()),
        entries,
    )
}

impl Feed {
    fn derive(&self, op: SetOp, others: &[&Feed]) -> Feed {
        let operands: Vec<&Feed> = std::iter::once(self).chain(others.iter().copied()).collect();
        let indexes: Vec<&EntryIndex> = operands.iter().map(|feed| feed.ensure_index()).collect();
        materialize(op, &operands, &indexes)
    }

    fn relation(&self, op: SetOp, other: &Feed) -> bool {
        matches!(combine(op, &[self, other]), Ok(SetOutcome::Bool(true)))
    }

    /// Entries found in this feed or any of `others`.
    pub fn union(&self, others: &[&Feed]) -> Feed {
        self.derive(SetOp::Union, others)
    }

    /// Entries found in this feed and in every one of `others`.
    pub fn intersection(&self, others: &[&Feed]) -> Feed {
        self.derive(SetOp::Intersection, others)
    }

    /// Entries of this feed found in none of `others`.
    pub fn difference(&self, others: &[&Feed]) -> Feed {
        self.derive(SetOp::Difference, others)
    }

    /// Entries found in exactly one of this feed and `others`.
    pub fn symmetric_difference(&self, others: &[&Feed]) -> Feed {
        self.derive(SetOp::SymmetricDifference, others)
    }

    pub fn isdisjoint(&self, other: &Feed) -> bool {
        self.relation(SetOp::IsDisjoint, other)
    }

    pub fn issubset(&self, other: &Feed) -> bool {
        self.relation(SetOp::IsSubset, other)
    }

    pub fn issuperset(&self, other: &Feed) -> bool {
        self.relation(SetOp::IsSuperset, other)
    }

    /// Number of distinct entry ids.
    pub fn len(&self) -> usize {
        self.ensure_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ensure_index().is_empty()
    }
}

macro_rules! feed_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<&Feed> for &Feed {
            type Output = Feed;

            fn $method(self, rhs: &Feed) -> Feed {
                self.derive($op, &[rhs])
            }
        }

        impl $trait<&Feed> for Feed {
            type Output = Feed;

            fn $method(self, rhs: &Feed) -> Feed {
                self.derive($op, &[rhs])
            }
        }
    };
}

feed_operator!(BitOr, bitor, SetOp::Union);
feed_operator!(BitAnd, bitand, SetOp::Intersection);
feed_operator!(Sub, sub, SetOp::Difference);
feed_operator!(BitXor, bitxor, SetOp::SymmetricDifference);

/// Two feeds are equal when they hold the same entry ids.
impl PartialEq for Feed {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.ensure_index(), other.ensure_index());
        a.len() == b.len() && a.is_subset(b)
    }
}

/// Subset order: `a < b` is a proper subset, and feeds that are neither
/// subset nor superset of each other are incomparable.
impl PartialOrd for Feed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (a, b) = (self.ensure_index(), other.ensure_index());
        match (a.is_subset(b), b.is_subset(a)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}
