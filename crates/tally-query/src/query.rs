//! Query trees.
//!
//! A [`Query`] is either a bare atom or a [`Composite`] of an [`Operator`]
//! over one or two sub-queries. Composites are validated when they are built,
//! so evaluation never fails.

use std::fmt;

use crate::error::QueryError;

/// A record predicate that can sit at the leaves of a [`Query`].
pub trait QueryAtom {
    /// The kind of record this atom tests.
    type Record: ?Sized;

    /// Whether a record satisfies this atom.
    fn is_match(&self, record: &Self::Record) -> bool;

    /// Whether this atom alone could force an unbounded scan.
    fn is_dangerous(&self) -> bool {
        false
    }
}

/// Set-style combinator of a composite query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// A bare atom: direct match.
    None,
    /// Pass-through of the single operand.
    Identity,
    /// Negation of the single operand.
    Complement,
    /// Either operand.
    Union,
    /// Both operands.
    Intersect,
    /// The left operand but not the right one.
    Subtract,
}

impl Operator {
    /// Number of operands the operator takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::None => 0,
            Self::Identity | Self::Complement => 1,
            Self::Union | Self::Intersect | Self::Subtract => 2,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Identity => "identity",
            Self::Complement => "complement",
            Self::Union => "union",
            Self::Intersect => "intersect",
            Self::Subtract => "subtract",
        };
        f.write_str(s)
    }
}

/// An operator applied to one or two sub-queries.
///
/// The fields are private: the only way to obtain a composite is
/// [`Composite::new`], which rejects operand counts the operator does not take.
#[derive(Debug, Clone)]
pub struct Composite<A> {
    op: Operator,
    left: Box<Query<A>>,
    right: Option<Box<Query<A>>>,
}

impl<A> Composite<A> {
    /// Build a composite, checking the operator's arity.
    pub fn new(op: Operator, left: Query<A>, right: Option<Query<A>>) -> Result<Self, QueryError> {
        let actual = 1 + usize::from(right.is_some());
        if op.arity() != actual {
            return Err(QueryError::Malformed {
                op,
                expected: op.arity(),
                actual,
            });
        }
        Ok(Self {
            op,
            left: Box::new(left),
            right: right.map(Box::new),
        })
    }

    /// The operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.op
    }

    /// The first operand.
    #[must_use]
    pub fn left(&self) -> &Query<A> {
        &self.left
    }

    /// The second operand of a binary operator.
    #[must_use]
    pub fn right(&self) -> Option<&Query<A>> {
        self.right.as_deref()
    }
}

/// A predicate tree over records of one kind.
#[derive(Debug, Clone)]
pub enum Query<A> {
    /// A bare atom.
    Atom(A),
    /// An operator over sub-queries.
    Composite(Composite<A>),
}

impl<A> From<A> for Query<A> {
    fn from(atom: A) -> Self {
        Self::Atom(atom)
    }
}

impl<A> Query<A> {
    fn unary(op: Operator, operand: Self) -> Self {
        Self::Composite(Composite {
            op,
            left: Box::new(operand),
            right: None,
        })
    }

    fn binary(op: Operator, left: Self, right: Self) -> Self {
        Self::Composite(Composite {
            op,
            left: Box::new(left),
            right: Some(Box::new(right)),
        })
    }

    /// Records matching either query.
    #[must_use]
    pub fn union(self, other: impl Into<Self>) -> Self {
        Self::binary(Operator::Union, self, other.into())
    }

    /// Records matching both queries.
    #[must_use]
    pub fn intersect(self, other: impl Into<Self>) -> Self {
        Self::binary(Operator::Intersect, self, other.into())
    }

    /// Records matching this query but not the other.
    #[must_use]
    pub fn subtract(self, other: impl Into<Self>) -> Self {
        Self::binary(Operator::Subtract, self, other.into())
    }

    /// Records not matching this query.
    #[must_use]
    pub fn complement(self) -> Self {
        Self::unary(Operator::Complement, self)
    }

    /// This query, wrapped.
    #[must_use]
    pub fn identity(self) -> Self {
        Self::unary(Operator::Identity, self)
    }

    /// The top-level operator; [`Operator::None`] for a bare atom.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        match self {
            Self::Atom(_) => Operator::None,
            Self::Composite(c) => c.op,
        }
    }

    /// The atom of a bare-atom query.
    #[must_use]
    pub const fn as_atom(&self) -> Option<&A> {
        match self {
            Self::Atom(a) => Some(a),
            Self::Composite(_) => None,
        }
    }

    /// All atoms of the tree, left to right.
    #[must_use]
    pub fn atoms(&self) -> Vec<&A> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a A>) {
        match self {
            Self::Atom(a) => out.push(a),
            Self::Composite(c) => {
                c.left.collect_atoms(out);
                if let Some(r) = &c.right {
                    r.collect_atoms(out);
                }
            }
        }
    }
}

impl<A: QueryAtom> Query<A> {
    /// Evaluate the tree against a record.
    pub fn evaluate(&self, record: &A::Record) -> bool {
        match self {
            Self::Atom(a) => a.is_match(record),
            Self::Composite(c) => {
                let left = c.left.evaluate(record);
                let right = || c.right.as_ref().is_some_and(|r| r.evaluate(record));
                match c.op {
                    Operator::None | Operator::Identity => left,
                    Operator::Complement => !left,
                    Operator::Union => left || right(),
                    Operator::Intersect => left && right(),
                    Operator::Subtract => left && !right(),
                }
            }
        }
    }

    /// Whether the tree could force an unbounded scan.
    ///
    /// Complements are dangerous in themselves. Any other composite is
    /// dangerous when one of its operands is.
    pub fn is_dangerous(&self) -> bool {
        match self {
            Self::Atom(a) => a.is_dangerous(),
            Self::Composite(c) => {
                c.op == Operator::Complement
                    || c.left.is_dangerous()
                    || c.right.as_ref().is_some_and(|r| r.is_dangerous())
            }
        }
    }
}
