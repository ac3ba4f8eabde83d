//! Strongly-typed action name

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Process-wide identity key of a declared action.
///
/// Names are never empty and are unique across tables, operations,
/// assertions and tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ActionName(String);

impl ActionName {
    /// `None` if `name` is empty
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ActionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        ActionName::try_new(name)
            .ok_or_else(|| serde::de::Error::custom("action name must not be empty"))
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for ActionName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by ActionName be queried with &str.
impl Borrow<str> for ActionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ActionName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ActionName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for ActionName {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_name_rejects_empty() {
        assert!(ActionName::try_new("").is_none());
        assert_eq!(ActionName::try_new("orders").unwrap(), "orders");
    }

    #[test]
    fn test_action_name_borrow_lookup() {
        use std::collections::BTreeMap;
        let mut map: BTreeMap<ActionName, i32> = BTreeMap::new();
        map.insert(ActionName::try_new("orders").unwrap(), 1);
        assert_eq!(map.get("orders"), Some(&1));
    }

    #[test]
    fn test_action_name_serde_is_transparent() {
        let name = ActionName::try_new("orders").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#""orders""#);
        let back: ActionName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
        assert!(serde_json::from_str::<ActionName>(r#""""#).is_err());
    }
}
