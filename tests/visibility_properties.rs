//! Visibility Filtering Property Tests
//!
//! - A value is returned iff the evaluator says it is visible
//! - Results preserve insertion order
//! - Look-ahead never changes what is returned
//! - Removal requires visibility

use zephyr_secure::data::{CategorizedValue, SecureAggregate};
use zephyr_secure::visibility::{
    Authorizations, PolicyEvaluator, PolicyParseError, VisibilityError, VisibilityExpression,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn value(id: &str, category: &str, visibility: &str) -> CategorizedValue {
    CategorizedValue::with_id(id, category, format!("v{}", id), "string", visibility, format!("meta-{}", category))
}

fn ids(values: &[CategorizedValue]) -> Vec<String> {
    values.iter().map(|v| v.id().to_string()).collect()
}

/// Three values: categories a,b,a guarded by X,Y,X.
fn scenario() -> SecureAggregate {
    let mut agg = SecureAggregate::with_id("event", "feed");
    agg.add(value("1", "a", "X"));
    agg.add_all(vec![value("2", "b", "Y"), value("3", "a", "X")]);
    agg
}

/// Mixed aggregate covering every label combination used below.
fn mixed() -> SecureAggregate {
    let mut agg = SecureAggregate::with_id("mixed", "feed");
    let guards = ["X", "Y", "", "Z", "X", "", "Y", "Z", "X"];
    agg.add_all(
        guards
            .iter()
            .enumerate()
            .map(|(i, g)| value(&i.to_string(), "c", g)),
    );
    agg
}

/// Accepts `A|B|...`: visible if any listed label is held.
#[derive(Debug)]
struct AnyOfEvaluator;

impl PolicyEvaluator for AnyOfEvaluator {
    fn evaluate(
        &self,
        expression: &VisibilityExpression,
        authorizations: &Authorizations,
    ) -> Result<bool, PolicyParseError> {
        let terms: Vec<&str> = expression.as_str().split('|').collect();
        if terms.iter().any(|t| t.is_empty()) {
            return Err(PolicyParseError::new(expression.as_str(), "empty term"));
        }
        Ok(terms.iter().any(|t| authorizations.contains(t)))
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_visible_list() {
    let agg = scenario();
    let visible = agg.to_visible_list(&Authorizations::new(["X"])).unwrap();
    assert_eq!(ids(&visible), vec!["1", "3"]);
}

#[test]
fn test_scenario_find_by_category() {
    let agg = scenario();
    assert_eq!(ids(&agg.find_by_category("a", &Authorizations::new(["X"])).unwrap()), vec!["1", "3"]);
    assert!(agg.find_by_category("a", &Authorizations::new(["Y"])).unwrap().is_empty());
}

/// Empty authorizations see nothing that is actually guarded.
#[test]
fn test_empty_authorizations_see_nothing_guarded() {
    let agg = scenario();
    assert!(agg.to_visible_list(&Authorizations::empty()).unwrap().is_empty());
    assert!(agg.metadata_keys(&Authorizations::empty()).unwrap().is_empty());
}

/// Unguarded values are the only thing empty authorizations see.
#[test]
fn test_empty_authorizations_see_unguarded() {
    let agg = mixed();
    let visible = agg.to_visible_list(&Authorizations::empty()).unwrap();
    assert_eq!(ids(&visible), vec!["2", "5"]);
}

#[test]
fn test_invisible_removal_leaves_value_in_place() {
    let mut agg = scenario();
    let hidden = value("2", "b", "Y");

    assert!(!agg.remove(&hidden, &Authorizations::new(["X"])).unwrap());
    assert_eq!(agg.len(), 3);

    let seen_by_y = agg.to_visible_list(&Authorizations::new(["Y"])).unwrap();
    assert_eq!(ids(&seen_by_y), vec!["2"]);
}

// =============================================================================
// Properties
// =============================================================================

/// Membership: returned iff evaluator says visible, for every auth subset.
#[test]
fn test_visible_iff_evaluator_true() {
    let agg = mixed();
    let labels = ["X", "Y", "Z"];

    for mask in 0..(1u8 << labels.len()) {
        let held: Vec<&str> = labels
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, l)| *l)
            .collect();
        let auths = Authorizations::new(held.iter().copied());

        let visible = agg.to_visible_list(&auths).unwrap();
        let expected: Vec<CategorizedValue> = agg
            .to_visible_list(&Authorizations::new(labels))
            .unwrap()
            .into_iter()
            .filter(|v| {
                let guard = v.visibility().as_str();
                guard.is_empty() || auths.contains(guard)
            })
            .collect();

        assert_eq!(visible, expected, "authorizations {}", auths);
    }
}

/// Visible list is a subsequence of insertion order.
#[test]
fn test_visible_list_is_ordered_subsequence() {
    let agg = mixed();
    let everything = ids(&agg.to_visible_list(&Authorizations::new(["X", "Y", "Z"])).unwrap());
    assert_eq!(everything, (0..9).map(|i| i.to_string()).collect::<Vec<_>>());

    let subset = ids(&agg.to_visible_list(&Authorizations::new(["Y", "Z"])).unwrap());
    let mut positions = subset.iter().map(|id| everything.iter().position(|e| e == id).unwrap());
    let mut last = positions.next().unwrap();
    for p in positions {
        assert!(p > last);
        last = p;
    }
}

/// Repeated look-ahead does not change the next value.
#[test]
fn test_has_more_idempotent() {
    let agg = mixed();
    let auths = Authorizations::new(["Z"]);

    let mut plain = agg.begin_traversal(&auths);
    let mut peeked = agg.begin_traversal(&auths);

    loop {
        for _ in 0..3 {
            peeked.has_more(&agg).unwrap();
        }
        match (plain.next(&agg), peeked.next(&agg)) {
            (Ok(a), Ok(b)) => assert_eq!(a.id(), b.id()),
            (Err(VisibilityError::Exhausted), Err(VisibilityError::Exhausted)) => break,
            other => panic!("traversals diverged: {:?}", other),
        }
    }
}

/// Query results are snapshots, not live views.
#[test]
fn test_results_are_independent_snapshots() {
    let mut agg = scenario();
    let auths = Authorizations::new(["X"]);
    let before = agg.find_by_category("a", &auths).unwrap();

    agg.remove(&before[0], &auths).unwrap();

    assert_eq!(ids(&before), vec!["1", "3"]);
    assert_eq!(ids(&agg.find_by_category("a", &auths).unwrap()), vec!["3"]);
}

#[test]
fn test_metadata_keys_sorted_distinct() {
    let mut agg = SecureAggregate::with_id("e", "feed");
    for (i, meta) in ["zeta", "alpha", "zeta", "mid"].iter().enumerate() {
        agg.add(CategorizedValue::with_id(i.to_string(), "c", "v", "t", "X", *meta));
    }
    agg.add(CategorizedValue::with_id("hidden", "c", "v", "t", "Y", "aaa"));

    let keys: Vec<String> = agg.metadata_keys(&Authorizations::new(["X"])).unwrap().into_iter().collect();
    assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
}

/// Debug output of the aggregate and its iterators never shows hidden values.
#[test]
fn test_debug_output_does_not_leak_hidden_values() {
    let mut agg = scenario();
    agg.add(CategorizedValue::with_id("ssn", "ssn", "123-45-6789", "string", "TOPSECRET", ""));
    let empty = Authorizations::empty();
    assert!(agg.to_visible_list(&empty).unwrap().is_empty());

    assert!(!format!("{:?}", agg.visible(&empty)).contains("123-45-6789"));
    assert!(!format!("{:?}", agg).contains("123-45-6789"));
    assert!(!format!("{:#?}", agg).contains("123-45-6789"));
}

// =============================================================================
// Removal Authorization
// =============================================================================

#[test]
fn test_remove_visible_value_erases_it() {
    let mut agg = scenario();
    let auths = Authorizations::new(["X", "Y"]);
    assert!(agg.remove(&value("2", "b", "Y"), &auths).unwrap());
    assert_eq!(ids(&agg.to_visible_list(&auths).unwrap()), vec!["1", "3"]);
}

/// A visible-looking id that matches nothing present never removes anything.
#[test]
fn test_remove_unknown_id_returns_false() {
    let mut agg = scenario();
    let auths = Authorizations::new(["X", "Y"]);
    let stranger = value("404", "a", "X");
    let before = agg.version();

    assert!(!agg.remove(&stranger, &auths).unwrap());
    assert_eq!(agg.len(), 3);
    assert_eq!(agg.version(), before);
}

/// Removing the same value twice succeeds once.
#[test]
fn test_remove_is_not_repeatable() {
    let mut agg = scenario();
    let auths = Authorizations::new(["X"]);
    let target = value("1", "a", "X");
    assert!(agg.remove(&target, &auths).unwrap());
    assert!(!agg.remove(&target, &auths).unwrap());
    assert_eq!(agg.len(), 2);
}

/// Absent and unauthorized are indistinguishable to the caller.
#[test]
fn test_absent_and_unauthorized_look_identical() {
    let mut agg = scenario();
    let auths = Authorizations::new(["X"]);
    let hidden = agg.remove(&value("2", "b", "Y"), &auths);
    let absent = agg.remove(&value("99", "b", "Y"), &auths);
    assert_eq!(hidden, absent);
}

// =============================================================================
// Evaluator Injection
// =============================================================================

#[test]
fn test_custom_evaluator_is_used() {
    let mut agg = SecureAggregate::with_id("e", "feed").with_evaluator(AnyOfEvaluator);
    agg.add_all(vec![value("1", "c", "X|Y"), value("2", "c", "Z"), value("3", "c", "Y")]);

    let visible = agg.to_visible_list(&Authorizations::new(["Y"])).unwrap();
    assert_eq!(ids(&visible), vec!["1", "3"]);
}

/// Malformed policies fail the query instead of being silently filtered.
#[test]
fn test_malformed_policy_fails_query() {
    let mut agg = SecureAggregate::with_id("e", "feed").with_evaluator(AnyOfEvaluator);
    agg.add_all(vec![value("1", "c", "X"), value("2", "c", "X||Y")]);

    let auths = Authorizations::new(["X"]);
    assert!(matches!(agg.to_visible_list(&auths), Err(VisibilityError::PolicyParse(_))));
    assert!(matches!(agg.find_by_category("c", &auths), Err(VisibilityError::PolicyParse(_))));
    assert!(matches!(agg.metadata_keys(&auths), Err(VisibilityError::PolicyParse(_))));
    assert!(matches!(agg.remove(&value("2", "c", "X||Y"), &auths), Err(VisibilityError::PolicyParse(_))));
    assert_eq!(agg.len(), 2);
}
