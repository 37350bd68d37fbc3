//! Validation rules and versioned rule sets.
//!
//! A [`ValidationRule`] is a `static` item: its identity is its address, so
//! a rule set can tell "the same rule twice" from "two rules that happen to
//! check the same thing". Rule sets are multimaps from [`NodeKind`] to rules,
//! kept in insertion order.

use std::fmt;
use std::ptr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::RuleSetError;
use crate::rules;
use crate::types::EdmVersion;
use crate::validator::{Node, NodeKind, ValidationContext};

/// Signature of a rule body.
pub type RuleCheck = fn(&mut ValidationContext<'_>, Node);

/// A named check that applies to one kind of node.
pub struct ValidationRule {
    name: &'static str,
    kind: NodeKind,
    check: RuleCheck,
}

impl ValidationRule {
    pub const fn new(name: &'static str, kind: NodeKind, check: RuleCheck) -> Self {
        Self { name, kind, check }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn evaluate(&self, context: &mut ValidationContext<'_>, node: Node) {
        (self.check)(context, node)
    }
}

impl PartialEq for ValidationRule {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for ValidationRule {}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Rules grouped by the node kind they apply to.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    buckets: IndexMap<NodeKind, Vec<&'static ValidationRule>>,
    len: usize,
}

impl RuleSet {
    /// Combine `base` and `additions`.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError::DuplicateRule` if any rule appears twice.
    pub fn new<B, A>(base: B, additions: A) -> Result<Self, RuleSetError>
    where
        B: IntoIterator<Item = &'static ValidationRule>,
        A: IntoIterator<Item = &'static ValidationRule>,
    {
        let mut set = RuleSet::default();
        for rule in base.into_iter().chain(additions) {
            set.insert(rule)?;
        }
        Ok(set)
    }

    fn insert(&mut self, rule: &'static ValidationRule) -> Result<(), RuleSetError> {
        let bucket = self.buckets.entry(rule.kind).or_default();
        if bucket.iter().any(|existing| ptr::eq(*existing, rule)) {
            return Err(RuleSetError::DuplicateRule {
                rule: rule.name,
                kind: rule.kind,
            });
        }
        bucket.push(rule);
        self.len += 1;
        Ok(())
    }

    /// A new set with `removed` taken out and `added` appended.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError::DuplicateRule` if an added rule is already present.
    pub fn derive(
        &self,
        removed: &[&'static ValidationRule],
        added: &[&'static ValidationRule],
    ) -> Result<Self, RuleSetError> {
        let kept = self
            .iter()
            .filter(|rule| !removed.iter().any(|r| ptr::eq(*r, *rule)));
        RuleSet::new(kept, added.iter().copied())
    }

    /// Rules for `kind`, in insertion order. Empty if none are registered.
    pub fn rules_for(&self, kind: NodeKind) -> &[&'static ValidationRule] {
        self.buckets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, rule: &ValidationRule) -> bool {
        self.rules_for(rule.kind)
            .iter()
            .any(|existing| ptr::eq(*existing, rule))
    }

    /// Every rule, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &'static ValidationRule> + '_ {
        self.buckets.values().flat_map(|bucket| bucket.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn built_in(result: Result<RuleSet, RuleSetError>) -> RuleSet {
    result.unwrap_or_else(|err| panic!("built-in rule set is invalid: {}", err))
}

static BASE_RULES: Lazy<RuleSet> =
    Lazy::new(|| built_in(RuleSet::new(rules::VERSION_INDEPENDENT.iter().copied(), [])));

static V1_RULES: Lazy<RuleSet> = Lazy::new(|| {
    built_in(BASE_RULES.derive(
        &[],
        &[
            &rules::COMPLEX_TYPE_MUST_NOT_BE_ABSTRACT,
            &rules::COMPLEX_TYPE_MUST_NOT_HAVE_BASE_TYPE,
            &rules::OPEN_TYPES_NOT_SUPPORTED,
            &rules::OPERATIONS_NOT_SUPPORTED_BEFORE_V2,
            &rules::ANNOTATIONS_NOT_SUPPORTED_BEFORE_V3,
            &rules::COMPLEX_PROPERTY_MUST_NOT_BE_NULLABLE,
            &rules::SINGLETONS_NOT_SUPPORTED_BEFORE_V4,
            &rules::COMPLEX_TYPE_MUST_CONTAIN_PROPERTIES,
        ],
    ))
});

static V1_1_RULES: Lazy<RuleSet> = Lazy::new(|| {
    built_in(V1_RULES.derive(
        &[
            &rules::COMPLEX_TYPE_MUST_NOT_BE_ABSTRACT,
            &rules::COMPLEX_TYPE_MUST_NOT_HAVE_BASE_TYPE,
        ],
        &[],
    ))
});

static V1_2_RULES: Lazy<RuleSet> =
    Lazy::new(|| built_in(V1_1_RULES.derive(&[&rules::OPEN_TYPES_NOT_SUPPORTED], &[])));

static V2_RULES: Lazy<RuleSet> = Lazy::new(|| {
    built_in(V1_2_RULES.derive(&[&rules::OPERATIONS_NOT_SUPPORTED_BEFORE_V2], &[]))
});

static V3_RULES: Lazy<RuleSet> = Lazy::new(|| {
    built_in(V2_RULES.derive(
        &[
            &rules::ANNOTATIONS_NOT_SUPPORTED_BEFORE_V3,
            &rules::COMPLEX_PROPERTY_MUST_NOT_BE_NULLABLE,
        ],
        &[],
    ))
});

static V4_RULES: Lazy<RuleSet> = Lazy::new(|| {
    built_in(V3_RULES.derive(
        &[
            &rules::SINGLETONS_NOT_SUPPORTED_BEFORE_V4,
            &rules::COMPLEX_TYPE_MUST_CONTAIN_PROPERTIES,
        ],
        &[
            &rules::NAVIGATION_PARTNER_MUST_EXIST,
            &rules::NAVIGATION_PARTNER_MUST_POINT_BACK,
            &rules::BOUND_OPERATION_MUST_HAVE_PARAMETERS,
            &rules::FUNCTION_MUST_HAVE_RETURN_TYPE,
        ],
    ))
});

/// Version-independent rules shared by every versioned set.
pub fn base_ruleset() -> &'static RuleSet {
    Lazy::force(&BASE_RULES)
}

/// The built-in rule set for `version`.
///
/// # Panics
///
/// Panics on first use if a built-in set registers a rule twice.
pub fn get_ruleset(version: EdmVersion) -> &'static RuleSet {
    match version {
        EdmVersion::V1 => Lazy::force(&V1_RULES),
        EdmVersion::V1_1 => Lazy::force(&V1_1_RULES),
        EdmVersion::V1_2 => Lazy::force(&V1_2_RULES),
        EdmVersion::V2 => Lazy::force(&V2_RULES),
        EdmVersion::V3 => Lazy::force(&V3_RULES),
        EdmVersion::V4 => Lazy::force(&V4_RULES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ValidationContext<'_>, _: Node) {}

    static FIRST: ValidationRule = ValidationRule::new("First", NodeKind::Term, noop);
    static SECOND: ValidationRule = ValidationRule::new("Second", NodeKind::Term, noop);
    static OTHER_KIND: ValidationRule = ValidationRule::new("Other", NodeKind::Operation, noop);

    #[test]
    fn identity_is_address() {
        assert_eq!(FIRST, FIRST);
        assert_ne!(FIRST, SECOND);
    }

    #[test]
    fn buckets_keep_insertion_order() {
        let set = RuleSet::new([&SECOND, &OTHER_KIND], [&FIRST]).unwrap();
        let names: Vec<_> = set.rules_for(NodeKind::Term).iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert_eq!(set.rules_for(NodeKind::Operation).len(), 1);
        assert!(set.rules_for(NodeKind::Singleton).is_empty());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn duplicate_rule_is_rejected() {
        let err = RuleSet::new([&FIRST], [&FIRST]).unwrap_err();
        assert_eq!(
            err,
            RuleSetError::DuplicateRule {
                rule: "First",
                kind: NodeKind::Term
            }
        );
    }

    #[test]
    fn derive_removes_then_adds() {
        let base = RuleSet::new([&FIRST, &SECOND], []).unwrap();
        let derived = base.derive(&[&FIRST], &[&OTHER_KIND]).unwrap();
        assert!(!derived.contains(&FIRST));
        assert!(derived.contains(&SECOND));
        assert!(derived.contains(&OTHER_KIND));
        assert!(base.contains(&FIRST));
    }
}
