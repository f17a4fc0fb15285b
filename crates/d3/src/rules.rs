//! Flag rules: custom grouping constraints over piece flags.
//!
//! Pieces carry `flag type -> flag value` pairs. A rule restricts, per container, how
//! the values of one flag type may be mixed.

use std::collections::BTreeSet;
use stowage_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of a flag rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlagRuleType {
    /// All pieces in a container share one value of the flag.
    Disjoint,
    /// At most `parameter` pieces per flag value in a container.
    LesserEqualsPieces,
    /// At most `parameter` distinct flag values in a container.
    LesserEqualsTypes,
}

/// A rule over one flag type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlagRule {
    /// Flag type the rule applies to.
    pub flag_id: i32,
    /// Rule kind.
    pub rule_type: FlagRuleType,
    /// Bound used by the `LesserEquals*` kinds.
    pub parameter: usize,
}

impl FlagRule {
    /// Creates a rule.
    pub fn new(flag_id: i32, rule_type: FlagRuleType, parameter: usize) -> Self {
        Self {
            flag_id,
            rule_type,
            parameter,
        }
    }

    /// Whether a piece carrying `value` for this rule's flag may join a container that
    /// already holds the flag values `contained`, `with_same_value` of them equal to `value`.
    ///
    /// Fails with [`Error::RuleViolation`] when the container state already breaks
    /// the rule, which only happens if placements bypassed the checks.
    pub fn admits(&self, value: i32, contained: &BTreeSet<i32>, with_same_value: usize) -> Result<bool> {
        match self.rule_type {
            FlagRuleType::Disjoint => {
                if contained.len() > 1 {
                    return Err(Error::RuleViolation(format!(
                        "{} values of flag {} in one container under a disjoint rule",
                        contained.len(),
                        self.flag_id
                    )));
                }
                Ok(contained.is_empty() || contained.contains(&value))
            }
            FlagRuleType::LesserEqualsPieces => Ok(with_same_value < self.parameter),
            FlagRuleType::LesserEqualsTypes => {
                if contained.len() > self.parameter {
                    return Err(Error::RuleViolation(format!(
                        "{} values of flag {} exceed the bound {}",
                        contained.len(),
                        self.flag_id,
                        self.parameter
                    )));
                }
                Ok(contained.contains(&value) || contained.len() < self.parameter)
            }
        }
    }
}
