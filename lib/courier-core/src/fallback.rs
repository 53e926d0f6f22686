//! Fallback policies: substitute results for covered HTTP failures.
//!
//! Many listing endpoints model "no such resource" as an empty collection
//! rather than an error. A [`Fallback`] states that convention once per
//! operation instead of at every call site.

use std::fmt;

use crate::{Decoded, Error};

/// What to return instead of a covered failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FallbackPolicy {
    /// Always propagate the failure.
    #[default]
    Propagate,
    /// An empty list.
    EmptyList,
    /// A JSON `null`, which decodes into `None`.
    NullValue,
    /// `false`, for existence checks and deletions.
    FalseValue,
    /// An empty paged sequence.
    EmptyIterable,
}

impl FallbackPolicy {
    /// The substitute value, or `None` for [`FallbackPolicy::Propagate`].
    #[must_use]
    pub fn substitute(self) -> Option<Decoded> {
        match self {
            Self::Propagate => None,
            Self::EmptyList | Self::EmptyIterable => Some(Decoded::Sequence(Vec::new())),
            Self::NullValue => Some(Decoded::Object(serde_json::Value::Null)),
            Self::FalseValue => Some(Decoded::Flag(false)),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Propagate => "propagate",
            Self::EmptyList => "empty-list",
            Self::NullValue => "null",
            Self::FalseValue => "false",
            Self::EmptyIterable => "empty-iterable",
        };
        f.write_str(name)
    }
}

/// Status predicate selecting the failures a policy covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StatusMatch {
    /// `404 Not Found`.
    #[default]
    NotFound,
    /// One specific status.
    Status(u16),
    /// Any of the listed statuses.
    AnyOf(Vec<u16>),
}

impl StatusMatch {
    /// Returns `true` if `status` is covered.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::NotFound => status == 404,
            Self::Status(expected) => status == *expected,
            Self::AnyOf(statuses) => statuses.contains(&status),
        }
    }
}

/// A policy paired with the statuses it covers.
///
/// # Example
///
/// ```
/// use courier_core::{Decoded, Error, Fallback, FallbackPolicy};
///
/// let fallback = Fallback::on_not_found(FallbackPolicy::EmptyList);
/// assert_eq!(
///     fallback.resolve(&Error::http(404, "Not Found")),
///     Some(Decoded::Sequence(vec![]))
/// );
/// assert_eq!(fallback.resolve(&Error::http(500, "boom")), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Fallback {
    policy: FallbackPolicy,
    on: StatusMatch,
}

impl Fallback {
    /// Never substitute.
    #[must_use]
    pub const fn propagate() -> Self {
        Self {
            policy: FallbackPolicy::Propagate,
            on: StatusMatch::NotFound,
        }
    }

    /// Substitute on `404 Not Found`.
    #[must_use]
    pub const fn on_not_found(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            on: StatusMatch::NotFound,
        }
    }

    /// Substitute on a custom status predicate.
    #[must_use]
    pub const fn on(policy: FallbackPolicy, on: StatusMatch) -> Self {
        Self { policy, on }
    }

    /// The substitute policy.
    #[must_use]
    pub const fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// The covered statuses.
    #[must_use]
    pub const fn status_match(&self) -> &StatusMatch {
        &self.on
    }

    /// Decide what to do with a failed call.
    ///
    /// Returns the substitute when the failure carries a covered status, or
    /// `None` when the caller must propagate `error` unchanged. Failures
    /// without a status (timeouts, refused connections, decode errors) are
    /// never covered.
    #[must_use]
    pub fn resolve(&self, error: &Error) -> Option<Decoded> {
        let status = error.status()?;
        if self.on.matches(status) {
            self.policy.substitute()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_on_404() {
        let fallback = Fallback::on_not_found(FallbackPolicy::EmptyList);
        assert_eq!(
            fallback.resolve(&Error::http(404, "Not Found")),
            Some(Decoded::Sequence(Vec::new()))
        );
    }

    #[test]
    fn empty_list_propagates_500() {
        let fallback = Fallback::on_not_found(FallbackPolicy::EmptyList);
        assert_eq!(fallback.resolve(&Error::http(500, "boom")), None);
    }

    #[test]
    fn substitutes_per_policy() {
        let not_found = Error::http(404, "Not Found");
        assert_eq!(
            Fallback::on_not_found(FallbackPolicy::NullValue).resolve(&not_found),
            Some(Decoded::Object(serde_json::Value::Null))
        );
        assert_eq!(
            Fallback::on_not_found(FallbackPolicy::FalseValue).resolve(&not_found),
            Some(Decoded::Flag(false))
        );
        assert_eq!(
            Fallback::on_not_found(FallbackPolicy::EmptyIterable).resolve(&not_found),
            Some(Decoded::Sequence(Vec::new()))
        );
        assert_eq!(Fallback::propagate().resolve(&not_found), None);
    }

    #[test]
    fn transport_failures_are_never_covered() {
        let fallback = Fallback::on_not_found(FallbackPolicy::EmptyList);
        assert_eq!(fallback.resolve(&Error::Timeout), None);
        assert_eq!(fallback.resolve(&Error::connection("refused")), None);
        assert_eq!(fallback.resolve(&Error::missing_selector("meters")), None);
    }

    #[test]
    fn custom_status_predicates() {
        let fallback = Fallback::on(FallbackPolicy::FalseValue, StatusMatch::AnyOf(vec![404, 409]));
        assert!(fallback.resolve(&Error::http(409, "Conflict")).is_some());
        assert!(fallback.resolve(&Error::http(400, "Bad Request")).is_none());

        let fallback = Fallback::on(FallbackPolicy::NullValue, StatusMatch::Status(410));
        assert!(fallback.resolve(&Error::http(410, "Gone")).is_some());
        assert!(fallback.resolve(&Error::http(404, "Not Found")).is_none());
    }

    #[test]
    fn policy_display() {
        assert_eq!(FallbackPolicy::EmptyList.to_string(), "empty-list");
        assert_eq!(FallbackPolicy::Propagate.to_string(), "propagate");
    }
}
