//! # Responsive Values
//!
//! A prop value may differ per breakpoint. The model is mobile-first:
//! `mobile` is always present, and a larger breakpoint with no explicit
//! value inherits the next-smaller defined one (the cascade).
//!
//! The two conversions between plain and responsive values live here as
//! pure, total functions so call sites never hand-roll the branching.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named viewport-size bucket, smallest to largest.
///
/// Ordering matters: the cascade walks from the requested breakpoint
/// downward through `cascade_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoint {
    /// Breakpoints to consult for a request at `self`, largest-first,
    /// ending at `Mobile`.
    pub fn cascade_order(self) -> &'static [Breakpoint] {
        match self {
            Breakpoint::Mobile => &[Breakpoint::Mobile],
            Breakpoint::Tablet => &[Breakpoint::Tablet, Breakpoint::Mobile],
            Breakpoint::Desktop => &[Breakpoint::Desktop, Breakpoint::Tablet, Breakpoint::Mobile],
        }
    }
}

/// A per-breakpoint value with a mandatory mobile baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponsiveValue<T> {
    pub mobile: T,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tablet: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub desktop: Option<T>,
}

impl<T> ResponsiveValue<T> {
    pub fn new(mobile: T) -> Self {
        Self {
            mobile,
            tablet: None,
            desktop: None,
        }
    }

    fn get(&self, breakpoint: Breakpoint) -> Option<&T> {
        match breakpoint {
            Breakpoint::Mobile => Some(&self.mobile),
            Breakpoint::Tablet => self.tablet.as_ref(),
            Breakpoint::Desktop => self.desktop.as_ref(),
        }
    }

    /// Resolve for a breakpoint by cascading downward to the first defined
    /// entry. `mobile` is the guaranteed terminal fallback, so this never
    /// fails.
    pub fn resolve(&self, breakpoint: Breakpoint) -> &T {
        for bp in breakpoint.cascade_order() {
            if let Some(value) = self.get(*bp) {
                return value;
            }
        }
        // cascade_order always ends at Mobile, which is mandatory
        &self.mobile
    }
}

/// A prop value: either a single value for all breakpoints or one that
/// varies per breakpoint.
///
/// Untagged on the wire. `ResponsiveValue` rejects unknown fields, so only
/// a JSON object whose keys are exactly breakpoint names deserializes as
/// responsive; any other object stays a plain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Responsive(ResponsiveValue<Value>),
    Plain(Value),
}

impl PropValue {
    pub fn plain(value: impl Into<Value>) -> Self {
        PropValue::Plain(value.into())
    }

    pub fn is_responsive(&self) -> bool {
        matches!(self, PropValue::Responsive(_))
    }
}

/// Resolve a prop value for a breakpoint. Plain values pass through
/// unchanged; responsive values cascade.
pub fn resolve(value: &PropValue, breakpoint: Breakpoint) -> &Value {
    match value {
        PropValue::Plain(v) => v,
        PropValue::Responsive(rv) => rv.resolve(breakpoint),
    }
}

/// Convert a plain value into a responsive one by seeding every breakpoint
/// with the current value. Lossless: no breakpoint renders differently
/// afterward.
pub fn expand_responsive(value: Value) -> ResponsiveValue<Value> {
    ResponsiveValue {
        mobile: value.clone(),
        tablet: Some(value.clone()),
        desktop: Some(value),
    }
}

/// Collapse a responsive value back to a single value, keeping only the
/// mobile baseline.
///
/// Explicitly lossy: tablet/desktop overrides are discarded. Callers must
/// confirm intent with the user before collapsing.
pub fn collapse_responsive<T>(value: ResponsiveValue<T>) -> T {
    value.mobile
}
