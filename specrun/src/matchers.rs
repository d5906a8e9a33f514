//! Value matchers consumed by `expect` and `assume`.
//!
//! A matcher is any `FnOnce(&actual, &expected) -> MatchResult`. On success
//! it reports whether the values matched, together with failure
//! descriptions for both polarities so a combinator like [`not`] can flip
//! the verdict without re-deriving text. A matcher that cannot evaluate
//! its inputs returns [`MatchError`], which the engine records as-is.

use std::fmt;

/// Outcome of applying a matcher to a pair of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the actual value matched the expected one.
    pub matched: bool,
    /// Description used when a positive check fails: "equals 20".
    pub pos: String,
    /// Description used when a negated check fails: "does not equal 20".
    pub neg: String,
}

/// A matcher that could not evaluate its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchError(pub String);

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MatchError {}

pub type MatchResult = Result<Verdict, MatchError>;

/// Matches when `actual == expected`.
pub fn equals<A, E>(actual: &A, expected: &E) -> MatchResult
where
    A: PartialEq<E>,
    E: fmt::Debug,
{
    Ok(Verdict {
        matched: actual == expected,
        pos: format!("equals {expected:?}"),
        neg: format!("does not equal {expected:?}"),
    })
}

/// Matches when `actual` is within `delta` of `expected`.
///
/// Hard-errors when any input is NaN or infinite; there is no meaningful
/// distance to compare against.
pub fn is_within(delta: f64) -> impl Fn(&f64, &f64) -> MatchResult {
    move |actual, expected| {
        for (label, value) in [("actual", *actual), ("expected", *expected), ("delta", delta)] {
            if !value.is_finite() {
                return Err(MatchError(format!("cannot compare: {label} is {value}")));
            }
        }
        Ok(Verdict {
            matched: (actual - expected).abs() <= delta,
            pos: format!("is within {expected} ± {delta}"),
            neg: format!("is not within {expected} ± {delta}"),
        })
    }
}

/// Matches when the `actual` collection contains `expected`.
pub fn contains<A, E>(actual: &A, expected: &E) -> MatchResult
where
    for<'a> &'a A: IntoIterator<Item = &'a E>,
    E: PartialEq + fmt::Debug,
{
    Ok(Verdict {
        matched: actual.into_iter().any(|item| item == expected),
        pos: format!("contains {expected:?}"),
        neg: format!("does not contain {expected:?}"),
    })
}

/// Negates a matcher, swapping its failure descriptions.
pub fn not<A, E, M>(matcher: M) -> impl FnOnce(&A, &E) -> MatchResult
where
    M: FnOnce(&A, &E) -> MatchResult,
{
    move |actual, expected| {
        let verdict = matcher(actual, expected)?;
        Ok(Verdict {
            matched: !verdict.matched,
            pos: verdict.neg,
            neg: verdict.pos,
        })
    }
}
