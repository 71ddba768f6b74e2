//! Operators as values.
//!
//! Search and ordering both accept an operator either as a comparison code
//! (`"=="`, `"<"`, ...), as a composable operator object, or as a raw callable.
//! Everything is normalized into one [`Predicate`] (for search) or one
//! three-way [`OrderFn`] (for ordering) before use.
//!
//! The generic wrappers ([`Infix`], [`Relation`], [`Unary`], [`Chain`]) are
//! usable on their own, outside of the tree.

use std::{cmp::Ordering, fmt, ops::BitOr, str::FromStr, sync::Arc};

use crate::{Error, Value, Warning};

#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize,
)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn test<T: PartialOrd + ?Sized>(&self, a: &T, b: &T) -> bool {
        match self {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        }
    }
}

impl FromStr for CmpOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<CmpOp, Error> {
        Ok(match s {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::Ne,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::Le,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::Ge,
            _ => return Err(Error::UnsupportedOperator(s.to_string())),
        })
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A two-argument function usable infix: `op.bind(a) | b`
pub struct Infix<A, B, R>(Arc<dyn Fn(A, B) -> R + Send + Sync>);

impl<A, B, R> Clone for Infix<A, B, R> {
    fn clone(&self) -> Self {
        Infix(self.0.clone())
    }
}

impl<A, B, R> Infix<A, B, R> {
    pub fn new(f: impl Fn(A, B) -> R + Send + Sync + 'static) -> Self {
        Infix(Arc::new(f))
    }

    pub fn apply(&self, a: A, b: B) -> R {
        (self.0)(a, b)
    }

    /// Fixes the left operand
    pub fn bind(&self, left: A) -> Partial<A, B, R> {
        Partial {
            op: self.clone(),
            left,
        }
    }
}

pub struct Partial<A, B, R> {
    op: Infix<A, B, R>,
    left: A,
}

impl<A, B, R> BitOr<B> for Partial<A, B, R> {
    type Output = R;

    fn bitor(self, right: B) -> R {
        self.op.apply(self.left, right)
    }
}

/// A comparison object: a two-argument predicate over borrowed operands
pub struct Relation<T: ?Sized>(Arc<dyn Fn(&T, &T) -> bool + Send + Sync>);

impl<T: ?Sized> Clone for Relation<T> {
    fn clone(&self) -> Self {
        Relation(self.0.clone())
    }
}

impl<T: ?Sized> Relation<T> {
    pub fn new(f: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        Relation(Arc::new(f))
    }

    pub fn test(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }

    pub fn bind<'a>(&self, left: &'a T) -> RelPartial<'a, T> {
        RelPartial {
            rel: self.clone(),
            left,
        }
    }

    /// Relation holding when `self` does not
    pub fn negate(&self) -> Relation<T>
    where
        T: 'static,
    {
        let rel = self.clone();
        Relation::new(move |a, b| !rel.test(a, b))
    }
}

impl<T: PartialOrd + ?Sized + 'static> From<CmpOp> for Relation<T> {
    fn from(op: CmpOp) -> Self {
        Relation::new(move |a: &T, b: &T| op.test(a, b))
    }
}

pub struct RelPartial<'a, T: ?Sized> {
    rel: Relation<T>,
    left: &'a T,
}

impl<'a, 'b, T: ?Sized> BitOr<&'b T> for RelPartial<'a, T> {
    type Output = bool;

    fn bitor(self, right: &'b T) -> bool {
        self.rel.test(self.left, right)
    }
}

/// A one-argument function. `f | g` composes into `x -> f(g(x))`.
pub struct Unary<T>(Arc<dyn Fn(T) -> T + Send + Sync>);

impl<T> Clone for Unary<T> {
    fn clone(&self) -> Self {
        Unary(self.0.clone())
    }
}

impl<T: 'static> Unary<T> {
    pub fn new(f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        Unary(Arc::new(f))
    }

    pub fn apply(&self, x: T) -> T {
        (self.0)(x)
    }

    /// `self` applied after `inner`
    pub fn compose(&self, inner: &Unary<T>) -> Unary<T> {
        let (outer, inner) = (self.clone(), inner.clone());
        Unary::new(move |x| outer.apply(inner.apply(x)))
    }
}

impl<T: 'static> BitOr<Unary<T>> for Unary<T> {
    type Output = Unary<T>;

    fn bitor(self, inner: Unary<T>) -> Unary<T> {
        self.compose(&inner)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Assoc {
    Left,
    Right,
}

/// Repeated application of one binary operator, grouped by its associativity
pub struct Chain<T> {
    op: Infix<T, T, T>,
    assoc: Assoc,
    first: T,
    rest: Vec<T>,
}

impl<T> Chain<T> {
    pub fn new(op: Infix<T, T, T>, assoc: Assoc, first: T) -> Chain<T> {
        Chain {
            op,
            assoc,
            first,
            rest: Vec::new(),
        }
    }

    pub fn then(mut self, operand: T) -> Chain<T> {
        self.rest.push(operand);
        self
    }

    pub fn eval(self) -> T {
        let Chain {
            op,
            assoc,
            first,
            mut rest,
        } = self;
        match assoc {
            Assoc::Left => rest.into_iter().fold(first, |acc, x| op.apply(acc, x)),
            Assoc::Right => match rest.pop() {
                None => first,
                Some(last) => {
                    let acc = rest.into_iter().rev().fold(last, |acc, x| op.apply(x, acc));
                    op.apply(first, acc)
                }
            },
        }
    }
}

impl<T> BitOr<T> for Chain<T> {
    type Output = Chain<T>;

    fn bitor(self, operand: T) -> Chain<T> {
        self.then(operand)
    }
}

/// Callable taking its arguments as a slice, with a declared arity
pub type DynFn<R> = Arc<dyn Fn(&[&Value]) -> R + Send + Sync>;

/// Three-way comparison used for ordering
pub type OrderFn = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// How search compares a node's field value with a target value
#[derive(Clone)]
pub enum Operator {
    Named(CmpOp),
    Relation(Relation<Value>),
    Dynamic { arity: usize, func: DynFn<bool> },
}

impl Operator {
    pub fn dynamic(arity: usize, f: impl Fn(&[&Value]) -> bool + Send + Sync + 'static) -> Self {
        Operator::Dynamic {
            arity,
            func: Arc::new(f),
        }
    }

    /// Normalizes into a predicate. With `cast`, the actual value is coerced to
    /// the kind of the target value before comparing.
    pub fn predicate(&self, cast: bool) -> Result<Predicate, Error> {
        let rel = match self {
            Operator::Named(op) => Relation::from(*op),
            Operator::Relation(rel) => rel.clone(),
            Operator::Dynamic { arity: 2, func } => {
                let func = func.clone();
                Relation::new(move |a, b| func(&[a, b]))
            }
            Operator::Dynamic { arity, .. } => return Err(Error::InvalidOperatorArity(*arity)),
        };
        Ok(Predicate { rel, cast })
    }
}

impl Default for Operator {
    fn default() -> Operator {
        Operator::Named(CmpOp::Eq)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Operator, Error> {
        s.parse().map(Operator::Named)
    }
}

impl From<CmpOp> for Operator {
    fn from(op: CmpOp) -> Operator {
        Operator::Named(op)
    }
}

impl From<Relation<Value>> for Operator {
    fn from(rel: Relation<Value>) -> Operator {
        Operator::Relation(rel)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Named(op) => write!(f, "Operator({op})"),
            Operator::Relation(_) => f.write_str("Operator(<relation>)"),
            Operator::Dynamic { arity, .. } => write!(f, "Operator(<dynamic/{arity}>)"),
        }
    }
}

#[derive(Clone)]
pub struct Predicate {
    rel: Relation<Value>,
    cast: bool,
}

impl Predicate {
    pub fn test(&self, actual: &Value, target: &Value, warnings: &mut Vec<Warning>) -> bool {
        if self.cast && actual.kind() != target.kind() {
            match actual.cast_to(target.kind()) {
                Ok(cast) => return self.rel.test(&cast, target),
                Err(e) => Warning::CastFailed {
                    value: e.value,
                    to: e.to,
                }
                .emit(warnings),
            }
        }
        self.rel.test(actual, target)
    }
}

/// How ordering compares two keys
#[derive(Clone)]
pub enum Comparator {
    Named(CmpOp),
    Relation(Relation<Value>),
    ThreeWay(OrderFn),
    Dynamic { arity: usize, func: DynFn<Ordering> },
}

impl Comparator {
    pub fn three_way(f: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static) -> Self {
        Comparator::ThreeWay(Arc::new(f))
    }

    pub fn dynamic(
        arity: usize,
        f: impl Fn(&[&Value]) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        Comparator::Dynamic {
            arity,
            func: Arc::new(f),
        }
    }

    /// Derives the three-way comparison. Equality codes cannot order anything.
    pub fn order_fn(&self) -> Result<OrderFn, Error> {
        Ok(match self {
            Comparator::Named(op @ (CmpOp::Eq | CmpOp::Ne)) => {
                return Err(Error::InvalidSortOperator(op.to_string()))
            }
            Comparator::Named(CmpOp::Lt | CmpOp::Le) => {
                Arc::new(|a: &Value, b: &Value| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            }
            Comparator::Named(CmpOp::Gt | CmpOp::Ge) => {
                Arc::new(|a: &Value, b: &Value| b.partial_cmp(a).unwrap_or(Ordering::Equal))
            }
            Comparator::Relation(rel) => {
                let rel = rel.clone();
                // non-strict relations hold both ways on ties
                Arc::new(move |a: &Value, b: &Value| match (rel.test(a, b), rel.test(b, a)) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => Ordering::Equal,
                })
            }
            Comparator::ThreeWay(f) => f.clone(),
            Comparator::Dynamic { arity: 2, func } => {
                let func = func.clone();
                Arc::new(move |a: &Value, b: &Value| func(&[a, b]))
            }
            Comparator::Dynamic { arity, .. } => return Err(Error::InvalidOperatorArity(*arity)),
        })
    }
}

impl Default for Comparator {
    fn default() -> Comparator {
        Comparator::Named(CmpOp::Lt)
    }
}

impl From<CmpOp> for Comparator {
    fn from(op: CmpOp) -> Comparator {
        Comparator::Named(op)
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Comparator, Error> {
        s.parse().map(Comparator::Named)
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Named(op) => write!(f, "Comparator({op})"),
            Comparator::Relation(_) => f.write_str("Comparator(<relation>)"),
            Comparator::ThreeWay(_) => f.write_str("Comparator(<three-way>)"),
            Comparator::Dynamic { arity, .. } => write!(f, "Comparator(<dynamic/{arity}>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueKind;

    #[test]
    fn infix_application() {
        let add = Infix::new(|a: i64, b: i64| a + b);
        assert_eq!(add.bind(1) | 2, 3);
        assert_eq!(add.apply(4, 5), 9);

        let less = Relation::<i64>::from(CmpOp::Lt);
        assert!(less.bind(&3) | &4);
        assert!(!(less.bind(&4) | &3));
        assert!(less.negate().test(&4, &3));
    }

    #[test]
    fn chains_respect_associativity() {
        let pow = Infix::new(|a: u64, b: u64| a.pow(b as u32));
        let left = Chain::new(pow.clone(), Assoc::Left, 2).then(3).then(2);
        assert_eq!(left.eval(), 64);
        let right = Chain::new(pow.clone(), Assoc::Right, 2) | 3 | 2;
        assert_eq!(right.eval(), 512);
        let right = Chain::new(pow.clone(), Assoc::Right, 2) | 2 | 3;
        assert_eq!(right.eval(), 256);
        assert_eq!(Chain::new(pow, Assoc::Right, 7).eval(), 7);
    }

    type Matrix = [[(i64, i64); 2]; 2];

    #[test]
    fn unary_composition() {
        let conj = Unary::new(|m: Matrix| m.map(|row| row.map(|(re, im)| (re, -im))));
        let transpose = Unary::new(|m: Matrix| [[m[0][0], m[1][0]], [m[0][1], m[1][1]]]);
        let m: Matrix = [[(1, 2), (3, 4)], [(5, 6), (7, 8)]];
        let conj_transpose = conj | transpose;
        assert_eq!(
            conj_transpose.apply(m),
            [[(1, -2), (5, -6)], [(3, -4), (7, -8)]]
        );

        let neg = Unary::new(|x: i64| -x);
        let double = Unary::new(|x: i64| x * 2);
        assert_eq!(neg.compose(&double).apply(5), -10);
    }

    #[test]
    fn operator_codes() {
        assert!(matches!("<=".parse::<Operator>(), Ok(Operator::Named(CmpOp::Le))));
        assert_eq!(
            "=<".parse::<CmpOp>(),
            Err(Error::UnsupportedOperator(String::from("=<")))
        );
        for op in ["==", "!=", "<", "<=", ">", ">="] {
            assert_eq!(op.parse::<CmpOp>().map(|o| o.symbol()), Ok(op));
        }
    }

    #[test]
    fn operator_arity_is_checked() {
        let three = Operator::dynamic(3, |args| args.len() == 3);
        assert!(matches!(
            three.predicate(true),
            Err(Error::InvalidOperatorArity(3))
        ));
        let two = Operator::dynamic(2, |args| args[0] == args[1]);
        let pred = two.predicate(false).expect("arity two is accepted");
        let mut warnings = Vec::new();
        assert!(pred.test(&Value::Int(1), &Value::Int(1), &mut warnings));
    }

    #[test]
    fn predicate_casts_actual_to_target() {
        let mut warnings = Vec::new();
        let pred = Operator::default().predicate(true).unwrap();
        assert!(pred.test(&Value::Int(50), &Value::from("50"), &mut warnings));
        assert!(pred.test(&Value::from("50"), &Value::Int(50), &mut warnings));
        assert!(warnings.is_empty());

        let strict = Operator::default().predicate(false).unwrap();
        assert!(!strict.test(&Value::from("50"), &Value::Int(50), &mut warnings));
    }

    #[test]
    fn failed_cast_warns_and_compares_uncast() {
        let mut warnings = Vec::new();
        let pred = Operator::Named(CmpOp::Ne).predicate(true).unwrap();
        assert!(pred.test(&Value::from("abc"), &Value::Int(1), &mut warnings));
        assert_eq!(
            warnings,
            vec![Warning::CastFailed {
                value: Value::from("abc"),
                to: ValueKind::Int,
            }]
        );
    }

    #[test]
    fn comparators() {
        assert!(matches!(
            "==".parse::<Comparator>().unwrap().order_fn(),
            Err(Error::InvalidSortOperator(_))
        ));
        assert!(matches!(
            Comparator::Named(CmpOp::Ne).order_fn(),
            Err(Error::InvalidSortOperator(_))
        ));

        let (one, two) = (Value::Int(1), Value::Int(2));
        let asc = Comparator::default().order_fn().unwrap();
        assert_eq!(asc(&one, &two), Ordering::Less);
        assert_eq!(asc(&two, &two), Ordering::Equal);
        let desc = Comparator::Named(CmpOp::Ge).order_fn().unwrap();
        assert_eq!(desc(&one, &two), Ordering::Greater);

        let rel = Comparator::Relation(Relation::from(CmpOp::Gt)).order_fn().unwrap();
        assert_eq!(rel(&two, &one), Ordering::Less);
        assert_eq!(rel(&one, &one), Ordering::Equal);
        let rel = Comparator::Relation(Relation::from(CmpOp::Le)).order_fn().unwrap();
        assert_eq!(rel(&one, &two), Ordering::Less);
        assert_eq!(rel(&two, &one), Ordering::Greater);
        assert_eq!(rel(&two, &two), Ordering::Equal);

        assert!(matches!(
            Comparator::dynamic(1, |_| Ordering::Equal).order_fn(),
            Err(Error::InvalidOperatorArity(1))
        ));
    }
}
