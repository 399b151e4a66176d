// ==============================================
// SIZE ESTIMATOR (integration)
// ==============================================

use std::collections::BTreeMap;
use std::rc::Rc;

use hotset::size::{EstimateSize, SizeVisitor, estimate_size, human_bytes};

#[cfg(feature = "json")]
mod json_literals {
    use serde_json::json;

    use super::*;

    #[test]
    fn literal_values_have_fixed_sizes() {
        assert_eq!(estimate_size(&json!({ "a": 1 })), 14);
        assert_eq!(estimate_size(&json!(123123)), 8);
        assert_eq!(estimate_size(&json!("1")), 6);
        assert_eq!(estimate_size(&json!([1, 2, 3])), 24);
        assert_eq!(estimate_size(&json!([null, { "a": 1 }, 1, "a"])), 30);
    }

    #[test]
    fn identity_does_not_matter() {
        let a = json!({ "user": { "name": "ada", "tags": ["x", "y"] } });
        let b: serde_json::Value = serde_json::from_str(&a.to_string()).unwrap();
        assert_eq!(estimate_size(&a), estimate_size(&b));
    }

    #[test]
    fn json_values_can_be_cached() {
        use hotset::builder::TwoTierBuilder;

        let mut cache = TwoTierBuilder::new()
            .max_size(4096)
            .build::<String, serde_json::Value>();
        cache.set("k".to_string(), json!({ "a": [1, 2, 3] }));
        assert!(cache.get(&"k".to_string()).is_some());
        assert!(cache.memory() > 0);
    }
}

#[test]
fn native_literals_match_json_rules() {
    let mut object = BTreeMap::new();
    object.insert("a".to_string(), 1f64);
    assert_eq!(estimate_size(&object), 14);
    assert_eq!(estimate_size(&123123f64), 8);
    assert_eq!(estimate_size("1"), 6);
    assert_eq!(estimate_size(&[1f64, 2.0, 3.0]), 24);
}

struct Profile {
    name: String,
    scores: Vec<u32>,
    friend: Option<Rc<Profile>>,
}

impl EstimateSize for Profile {
    fn estimate_size_with(&self, visitor: &mut SizeVisitor) -> usize {
        self.name.estimate_size_with(visitor)
            + self.scores.estimate_size_with(visitor)
            + self.friend.estimate_size_with(visitor)
    }
}

#[test]
fn user_types_compose() {
    let friend = Rc::new(Profile {
        name: "bob".into(),
        scores: vec![],
        friend: None,
    });
    let profile = Profile {
        name: "alice".into(),
        scores: vec![1, 2],
        friend: Some(Rc::clone(&friend)),
    };
    // "alice" 10 + scores 8 + "bob" 6 + empty 0 + None 2
    assert_eq!(estimate_size(&profile), 26);
}

#[test]
fn human_bytes_matches_log_format() {
    assert_eq!(human_bytes(0), "0 Byte");
    assert_eq!(human_bytes(1023), "1023 Bytes");
    assert_eq!(human_bytes(10 * 1024), "10 KB");
}
