use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use despachos_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{ExpandedPermissions, GrantedPermissions, PermissionCode};

/// Static table of implied permissions: a parent code grants its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyTable(BTreeMap<PermissionCode, BTreeSet<PermissionCode>>);

impl HierarchyTable {
    /// Creates a table from parent/children entries.
    ///
    /// Repeated parents are merged.
    #[must_use]
    pub fn new(
        entries: impl IntoIterator<Item = (PermissionCode, Vec<PermissionCode>)>,
    ) -> Self {
        let mut table: BTreeMap<PermissionCode, BTreeSet<PermissionCode>> = BTreeMap::new();
        for (parent, children) in entries {
            table.entry(parent).or_default().extend(children);
        }

        Self(table)
    }

    /// Creates a table from raw string entries, validating every code.
    pub fn from_strs<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> AppResult<Self> {
        let mut parsed = Vec::new();
        for (parent, children) in entries {
            let children = children
                .iter()
                .map(|child| PermissionCode::new(*child))
                .collect::<AppResult<Vec<_>>>()?;
            parsed.push((PermissionCode::new(parent)?, children));
        }

        Ok(Self::new(parsed))
    }

    /// Returns the codes directly implied by a parent code.
    #[must_use]
    pub fn implied_by(&self, code: &PermissionCode) -> Option<&BTreeSet<PermissionCode>> {
        self.0.get(code)
    }

    /// Returns the number of parent entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns every parent code that transitively implies itself.
    ///
    /// A well-formed table returns nothing. Expansion terminates either way.
    #[must_use]
    pub fn cycles(&self) -> Vec<PermissionCode> {
        self.0
            .keys()
            .filter(|code| self.closure_of(code).contains(*code))
            .cloned()
            .collect()
    }

    /// Codes reachable from `code` through one or more hops.
    fn closure_of(&self, code: &PermissionCode) -> BTreeSet<PermissionCode> {
        let mut reached = BTreeSet::new();
        let mut pending: Vec<&PermissionCode> = self
            .implied_by(code)
            .map(|children| children.iter().collect())
            .unwrap_or_default();

        while let Some(next) = pending.pop() {
            if !reached.insert(next.clone()) {
                continue;
            }
            if let Some(children) = self.implied_by(next) {
                pending.extend(children.iter());
            }
        }

        reached
    }
}

/// How far granted codes are expanded through the hierarchy table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    /// Only the entries of directly granted codes are added.
    #[default]
    OneLevel,
    /// Implied codes are expanded again until nothing new is added.
    FullClosure,
}

impl ExpansionMode {
    /// Returns a stable configuration value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneLevel => "one_level",
            Self::FullClosure => "full_closure",
        }
    }
}

impl FromStr for ExpansionMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "one_level" => Ok(Self::OneLevel),
            "full_closure" => Ok(Self::FullClosure),
            _ => Err(AppError::Validation(format!(
                "unknown expansion mode '{value}'"
            ))),
        }
    }
}

/// Expands granted codes through the hierarchy table.
///
/// In [`ExpansionMode::OneLevel`] only the directly granted codes are looked up,
/// so a code added by implication is not expanded again. Codes missing from the
/// table imply nothing.
#[must_use]
pub fn expand_permissions(
    granted: &GrantedPermissions,
    hierarchy: &HierarchyTable,
    mode: ExpansionMode,
) -> ExpandedPermissions {
    let mut expanded: BTreeSet<PermissionCode> = granted.iter().cloned().collect();

    match mode {
        ExpansionMode::OneLevel => {
            for code in granted.iter() {
                if let Some(children) = hierarchy.implied_by(code) {
                    expanded.extend(children.iter().cloned());
                }
            }
        }
        ExpansionMode::FullClosure => {
            let mut pending: Vec<&PermissionCode> = granted.iter().collect();
            let mut visited = BTreeSet::new();
            while let Some(code) = pending.pop() {
                if !visited.insert(code) {
                    continue;
                }
                if let Some(children) = hierarchy.implied_by(code) {
                    for child in children {
                        expanded.insert(child.clone());
                        pending.push(child);
                    }
                }
            }
        }
    }

    ExpandedPermissions::from_set(expanded)
}
