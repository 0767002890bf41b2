use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use despachos_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque authorization token, conventionally `<module>.<action>`.
///
/// The dot structure is a naming convention only; codes are compared as whole
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(NonEmptyString);

impl PermissionCode {
    /// Creates a validated permission code.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PermissionCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Permission codes a user holds directly, as delivered by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantedPermissions(BTreeSet<PermissionCode>);

impl GrantedPermissions {
    /// Returns an empty grant set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes a raw grant payload into a typed grant set.
    ///
    /// Arrays contribute every non-blank string element. Objects contribute
    /// each key whose value is truthy. Any other shape yields no grants.
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        match raw {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|code| PermissionCode::new(code).ok())
                .collect(),
            Value::Object(entries) => entries
                .iter()
                .filter(|(_, flag)| is_truthy(flag))
                .filter_map(|(code, _)| PermissionCode::new(code.as_str()).ok())
                .collect(),
            _ => Self::empty(),
        }
    }

    /// Returns the number of granted codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no codes are granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates granted codes in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionCode> {
        self.0.iter()
    }
}

impl FromIterator<PermissionCode> for GrantedPermissions {
    fn from_iter<I: IntoIterator<Item = PermissionCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Granted codes plus every code they imply through the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandedPermissions(BTreeSet<PermissionCode>);

impl ExpandedPermissions {
    pub(crate) fn from_set(codes: BTreeSet<PermissionCode>) -> Self {
        Self(codes)
    }

    /// Returns whether the code is held directly or by implication.
    #[must_use]
    pub fn contains(&self, code: &PermissionCode) -> bool {
        self.0.contains(code)
    }

    /// Returns whether the raw code string is held.
    #[must_use]
    pub fn contains_str(&self, code: &str) -> bool {
        PermissionCode::new(code).is_ok_and(|code| self.0.contains(&code))
    }

    /// Returns whether every code is held. An empty requirement is satisfied.
    #[must_use]
    pub fn contains_all<'a>(&self, codes: impl IntoIterator<Item = &'a PermissionCode>) -> bool {
        codes.into_iter().all(|code| self.contains(code))
    }

    /// Returns the number of held codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates held codes in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionCode> {
        self.0.iter()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
