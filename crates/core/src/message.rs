//! Failure-message templates, one per comparator.
//!
//! Placeholders: `{alias}` (display name of the condition), `{expected}` and
//! `{actual}`.

use crate::comparator::Comparator;
use crate::condition::Condition;
use crate::value::Value;

const TEMPLATES: [(Comparator, &str); 31] = [
    (Comparator::Equal, "{alias} expected equal {expected}, actual is {actual}"),
    (Comparator::NotEqual, "{alias} expected not equal {expected}, actual is {actual}"),
    (Comparator::Null, "{alias} expected to be null, actual is {actual}"),
    (Comparator::NotNull, "{alias} expected to be not null, actual is {actual}"),
    (Comparator::IsTrue, "{alias} expected to be true, actual is {actual}"),
    (Comparator::IsFalse, "{alias} expected to be false, actual is {actual}"),
    (Comparator::LessThan, "{alias} expected less than {expected}, actual is {actual}"),
    (
        Comparator::LessThanOrEqual,
        "{alias} expected less or equal to {expected}, actual is {actual}",
    ),
    (Comparator::GreaterThan, "{alias} expected greater than {expected}, actual is {actual}"),
    (
        Comparator::GreaterThanOrEqual,
        "{alias} expected greater or equal to {expected}, actual is {actual}",
    ),
    (Comparator::Between, "{alias} expected in range {expected}, actual is {actual}"),
    (Comparator::In, "{alias} expected in {expected}, actual is {actual}"),
    (Comparator::NotIn, "{alias} expected not in {expected}, actual is {actual}"),
    (Comparator::Contains, "{alias} expected contains {expected}, actual is {actual}"),
    (Comparator::NotContain, "{alias} expected not contain {expected}, actual is {actual}"),
    (Comparator::Matches, "{alias} expected matches <Predicate>, actual is {actual}"),
    (Comparator::NotMatch, "{alias} expected not match <Predicate>, actual is {actual}"),
    (
        Comparator::AnyMatch,
        "{alias} expected any element matches <Predicate>, actual is {actual}",
    ),
    (Comparator::ListIsEmpty, "{alias} expected list is empty, actual is {actual}"),
    (Comparator::ListNotEmpty, "{alias} expected list is not empty, actual is {actual}"),
    (Comparator::ListHasSize, "{alias} expected list has size {expected}, actual is {actual}"),
    (Comparator::ListEquals, "{alias} expected list equals {expected}, actual is {actual}"),
    (
        Comparator::ListEqualsAtAnyOrder,
        "{alias} expected list equals {expected} at any order, actual is {actual}",
    ),
    (Comparator::ListNotEqual, "{alias} expected list not equal {expected}, actual is {actual}"),
    (Comparator::ListContains, "{alias} expected list contains {expected}, actual is {actual}"),
    (
        Comparator::ListContainsAny,
        "{alias} expected list contains any of {expected}, actual is {actual}",
    ),
    (
        Comparator::ListNotContain,
        "{alias} expected list not contain {expected}, actual is {actual}",
    ),
    (
        Comparator::ListIsOrderedAsc,
        "{alias} expected list is ordered ascending, actual is {actual}",
    ),
    (
        Comparator::ListIsOrderedDesc,
        "{alias} expected list is ordered descending, actual is {actual}",
    ),
    (Comparator::ListMatches, "{alias} expected list matches <Predicate>, actual is {actual}"),
    (
        Comparator::ListNotMatch,
        "{alias} expected list not match <Predicate>, actual is {actual}",
    ),
];

/// The raw template for `comparator`.
pub fn template(comparator: Comparator) -> &'static str {
    TEMPLATES
        .iter()
        .find(|(c, _)| *c == comparator)
        .map(|(_, t)| *t)
        .unwrap_or("{alias} expected {expected}, actual is {actual}")
}

/// Render the failure message of `condition` for an observed `actual`.
pub fn render(condition: &Condition, actual: &Value) -> String {
    let alias = condition.display_name();
    let expected = condition.expected().to_string();
    let actual = actual.to_string();
    fill(template(condition.comparator()), &alias, &expected, &actual)
}

fn fill(template: &str, alias: &str, expected: &str, actual: &str) -> String {
    let mut out = String::with_capacity(template.len() + alias.len() + actual.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let (text, consumed) = if tail.starts_with("{alias}") {
            (alias, "{alias}".len())
        } else if tail.starts_with("{expected}") {
            (expected, "{expected}".len())
        } else if tail.starts_with("{actual}") {
            (actual, "{actual}".len())
        } else {
            ("{", 1)
        };
        out.push_str(text);
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::condition::{Boundary, Condition};

    #[test]
    fn every_comparator_has_a_template() {
        for c in Comparator::ALL {
            assert!(TEMPLATES.iter().any(|(t, _)| *t == c), "missing {}", c);
        }
    }

    #[test]
    fn equal_message_names_alias_expected_and_actual() {
        let c = Condition::new("name", Comparator::Equal, Value::from("bob")).unwrap();
        assert_eq!(
            render(&c, &Value::from("alice")),
            "name expected equal bob, actual is alice"
        );
    }

    #[test]
    fn aggregate_and_boundary_rendering() {
        let c = Condition::aggregate(
            Aggregate::Avg,
            "age",
            Comparator::Between,
            Boundary::with_exclusions(10, true, 20, false).unwrap(),
        )
        .unwrap();
        assert_eq!(
            render(&c, &Value::from(25)),
            "avg of age expected in range (10,20], actual is 25"
        );
    }

    #[test]
    fn braces_in_values_are_not_reinterpreted() {
        let c = Condition::new("note", Comparator::Equal, Value::from("{actual}"))
            .unwrap()
            .with_alias("{expected}");
        assert_eq!(
            render(&c, &Value::from("x")),
            "{expected} expected equal {actual}, actual is x"
        );
    }
}
