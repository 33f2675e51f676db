//! Naming conventions shared by the renderer.
//!
//! - style keys are camelCase, class names are kebab-case
//! - tag attributes are kebab-case, property names are camelCase
//! - component names are kebab-case identifiers

use convert_case::{Case, Casing};

/// Class name generated for a logical style key (`buttonPrimary` -> `button-primary`).
pub fn class_name(key: &str) -> String {
    key.to_case(Case::Kebab)
}

/// Property name for a tag attribute (`max-count` -> `maxCount`).
///
/// Names without a hyphen are returned unchanged.
pub fn attribute_to_property(name: &str) -> String {
    if name.contains('-') {
        name.to_case(Case::Camel)
    } else {
        name.to_string()
    }
}

/// Tag attribute for a property name (`maxCount` -> `max-count`).
pub fn property_to_attribute(name: &str) -> String {
    name.to_case(Case::Kebab)
}

/// Check that `name` is a non-empty kebab-case identifier: a lowercase ASCII
/// letter, then lowercase letters or digits, with single hyphens between parts.
pub fn is_component_name(name: &str) -> bool {
    let mut parts = name.split('-');
    let first_ok = parts
        .next()
        .and_then(|part| part.chars().next())
        .is_some_and(|c| c.is_ascii_lowercase());
    first_ok
        && name.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("buttonPrimary"), "button-primary");
        assert_eq!(class_name("card"), "card");
        assert_eq!(class_name("cardHeaderTitle"), "card-header-title");
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(attribute_to_property("max-count"), "maxCount");
        assert_eq!(attribute_to_property("step"), "step");
        assert_eq!(attribute_to_property("maxCount"), "maxCount");
        assert_eq!(property_to_attribute("maxCount"), "max-count");
    }

    #[test]
    fn test_component_names() {
        assert!(is_component_name("counter"));
        assert!(is_component_name("todo-item"));
        assert!(is_component_name("h2-title"));
        assert!(!is_component_name(""));
        assert!(!is_component_name("Counter"));
        assert!(!is_component_name("todo--item"));
        assert!(!is_component_name("-todo"));
        assert!(!is_component_name("todo-"));
        assert!(!is_component_name("2col"));
        assert!(!is_component_name("todo_item"));
    }

    proptest! {
        #[test]
        fn prop_class_name_is_kebab_of_camel_words(
            head in "[a-z]{1,6}",
            tail in proptest::collection::vec("[A-Z][a-z]{1,6}", 0..4),
        ) {
            let key = format!("{}{}", head, tail.concat());
            let mut expected = head.clone();
            for word in &tail {
                expected.push('-');
                expected.push_str(&word.to_lowercase());
            }
            prop_assert_eq!(class_name(&key), expected.clone());
            // Pure: the same key always yields the same class.
            prop_assert_eq!(class_name(&key), class_name(&key));
            // Injective on camelCase keys: the key can be recovered.
            prop_assert_eq!(attribute_to_property(&expected), key);
        }
    }
}
