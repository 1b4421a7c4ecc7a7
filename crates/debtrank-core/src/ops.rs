//! Operator algebra: unary and binary operators, monoids and semirings.
//!
//! Operators are closed enums over `f64`. Boolean operators treat any
//! non-zero value as `true` and produce `1.0`/`0.0`. Institution states are
//! encoded as the codes [`UNDISTRESSED`], [`DISTRESSED`] and [`INACTIVE`] so
//! that state updates can run through the same elementwise machinery as
//! health updates.

use crate::error::{SparseError, SparseResult};

/// State code for an institution that has not been hit.
pub const UNDISTRESSED: f64 = 0.0;
/// State code for an institution currently propagating distress.
pub const DISTRESSED: f64 = 1.0;
/// State code for an institution whose contribution is frozen.
pub const INACTIVE: f64 = 2.0;

fn truthy(x: f64) -> bool {
    x != 0.0
}

fn from_bool(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Elementwise unary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Identity,
    /// `min(x, 1)`
    ClampToOne,
    /// `max(x, 1)`
    ClampFloor,
    /// `x > 0 → 1`, else `0`
    ThresholdToState,
    /// `x == 0 → 2`, else `0`
    ZeroToInactive,
    /// `x == 1 → 2`, else `0`
    DistressedToInactive,
    Abs,
}

impl UnaryOp {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Identity => x,
            UnaryOp::ClampToOne => x.min(1.0),
            UnaryOp::ClampFloor => x.max(1.0),
            UnaryOp::ThresholdToState => {
                if x > 0.0 {
                    DISTRESSED
                } else {
                    UNDISTRESSED
                }
            }
            UnaryOp::ZeroToInactive => {
                if x == 0.0 {
                    INACTIVE
                } else {
                    UNDISTRESSED
                }
            }
            UnaryOp::DistressedToInactive => {
                if x == DISTRESSED {
                    INACTIVE
                } else {
                    UNDISTRESSED
                }
            }
            UnaryOp::Abs => x.abs(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Identity => "identity",
            UnaryOp::ClampToOne => "min_one",
            UnaryOp::ClampFloor => "max_one",
            UnaryOp::ThresholdToState => "threshold_state",
            UnaryOp::ZeroToInactive => "zero_inactive",
            UnaryOp::DistressedToInactive => "distressed_inactive",
            UnaryOp::Abs => "abs",
        }
    }
}

/// Elementwise binary operator `f(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    /// `x / y`; a zero `y` is an error rather than an infinity.
    TrueDiv,
    Min,
    Max,
    LAnd,
    LOr,
    /// `x + beta * y`, used to damp indirect contagion.
    DecayedPlus { beta: f64 },
}

impl BinaryOp {
    /// Apply the operator, rejecting division by zero.
    pub fn apply(self, x: f64, y: f64) -> SparseResult<f64> {
        if let BinaryOp::TrueDiv = self {
            if y == 0.0 {
                return Err(SparseError::DivisionByZero { numerator: x });
            }
        }
        Ok(self.eval(x, y))
    }

    /// Total evaluation. Only reachable for `TrueDiv` after the zero check.
    pub(crate) fn eval(self, x: f64, y: f64) -> f64 {
        match self {
            BinaryOp::Plus => x + y,
            BinaryOp::Minus => x - y,
            BinaryOp::Times => x * y,
            BinaryOp::TrueDiv => x / y,
            BinaryOp::Min => x.min(y),
            BinaryOp::Max => x.max(y),
            BinaryOp::LAnd => from_bool(truthy(x) && truthy(y)),
            BinaryOp::LOr => from_bool(truthy(x) || truthy(y)),
            BinaryOp::DecayedPlus { beta } => x + beta * y,
        }
    }

    /// Whether [`BinaryOp::apply`] can fail.
    pub fn is_fallible(&self) -> bool {
        matches!(self, BinaryOp::TrueDiv)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Plus => "plus",
            BinaryOp::Minus => "minus",
            BinaryOp::Times => "times",
            BinaryOp::TrueDiv => "truediv",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::LAnd => "land",
            BinaryOp::LOr => "lor",
            BinaryOp::DecayedPlus { .. } => "decayed_plus",
        }
    }
}

/// Associative, commutative binary operator with an identity element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Monoid {
    op: BinaryOp,
    identity: f64,
}

impl Monoid {
    pub const PLUS: Monoid = Monoid {
        op: BinaryOp::Plus,
        identity: 0.0,
    };
    pub const MAX: Monoid = Monoid {
        op: BinaryOp::Max,
        identity: f64::NEG_INFINITY,
    };
    pub const MIN: Monoid = Monoid {
        op: BinaryOp::Min,
        identity: f64::INFINITY,
    };
    pub const LAND: Monoid = Monoid {
        op: BinaryOp::LAnd,
        identity: 1.0,
    };
    pub const LOR: Monoid = Monoid {
        op: BinaryOp::LOr,
        identity: 0.0,
    };

    /// Build a custom monoid.
    ///
    /// The caller vouches for associativity and commutativity; fallible
    /// operators are rejected because a fold has no error path.
    pub fn new(op: BinaryOp, identity: f64) -> SparseResult<Self> {
        if op.is_fallible() {
            return Err(SparseError::OperatorKind {
                name: op.as_str().to_string(),
                expected: "total binary operator",
                found: "fallible binary operator",
            });
        }
        Ok(Self { op, identity })
    }

    pub fn op(&self) -> BinaryOp {
        self.op
    }

    pub fn identity(&self) -> f64 {
        self.identity
    }

    pub fn combine(&self, a: f64, b: f64) -> f64 {
        self.op.eval(a, b)
    }

    /// Fold in iteration order, starting from the identity.
    pub fn fold<I: IntoIterator<Item = f64>>(&self, values: I) -> f64 {
        values
            .into_iter()
            .fold(self.identity, |acc, x| self.combine(acc, x))
    }
}

/// A multiplicative combine paired with an additive monoid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Semiring {
    multiply: BinaryOp,
    add: Monoid,
}

impl Semiring {
    pub const PLUS_TIMES: Semiring = Semiring {
        multiply: BinaryOp::Times,
        add: Monoid::PLUS,
    };
    pub const MAX_TIMES: Semiring = Semiring {
        multiply: BinaryOp::Times,
        add: Monoid::MAX,
    };
    pub const MIN_PLUS: Semiring = Semiring {
        multiply: BinaryOp::Plus,
        add: Monoid::MIN,
    };
    pub const LOR_LAND: Semiring = Semiring {
        multiply: BinaryOp::LAnd,
        add: Monoid::LOR,
    };

    pub fn new(multiply: BinaryOp, add: Monoid) -> Self {
        Self { multiply, add }
    }

    /// `(decayed_plus(beta), plus)`.
    pub fn damped(beta: f64) -> Self {
        Self {
            multiply: BinaryOp::DecayedPlus { beta },
            add: Monoid::PLUS,
        }
    }

    /// Replace the damping factor of a decayed semiring; other semirings are returned unchanged.
    pub fn with_decay(self, beta: f64) -> Self {
        match self.multiply {
            BinaryOp::DecayedPlus { .. } => Self {
                multiply: BinaryOp::DecayedPlus { beta },
                ..self
            },
            _ => self,
        }
    }

    pub fn multiply(&self) -> BinaryOp {
        self.multiply
    }

    pub fn add(&self) -> Monoid {
        self.add
    }
}

/// Value predicate used to build masks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectOp {
    Eq(f64),
    Ne(f64),
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
}

impl SelectOp {
    pub fn matches(self, x: f64) -> bool {
        match self {
            SelectOp::Eq(t) => x == t,
            SelectOp::Ne(t) => x != t,
            SelectOp::Gt(t) => x > t,
            SelectOp::Ge(t) => x >= t,
            SelectOp::Lt(t) => x < t,
            SelectOp::Le(t) => x <= t,
        }
    }
}
