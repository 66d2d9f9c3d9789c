use nexus_bulk::condition::{ConditionValue, coerce};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_integers_coerce_to_numbers(n in any::<i32>()) {
        prop_assert_eq!(coerce(&n.to_string()), ConditionValue::Number(f64::from(n)));
    }

    #[test]
    fn prop_words_stay_strings(s in "[a-zA-Z_][a-zA-Z0-9_ ]{0,20}") {
        let lower = s.to_ascii_lowercase();
        prop_assume!(lower != "true" && lower != "false" && s != "null");
        prop_assert_eq!(coerce(&s), ConditionValue::String(s.clone()));
    }

    #[test]
    fn prop_booleans_ignore_case(b in any::<bool>(), upper in any::<bool>()) {
        let raw = if upper { b.to_string().to_uppercase() } else { b.to_string() };
        prop_assert_eq!(coerce(&raw), ConditionValue::Bool(b));
    }
}
