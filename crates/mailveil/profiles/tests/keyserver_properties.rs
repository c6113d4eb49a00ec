//! Property tests: keyserver argument strings.
//!
//! Hiding key ids inserts exactly one flag, right after `--no-comments` and
//! before `--display-charset`, and the builder is deterministic.

use mailveil_profiles::{keyserver_args, KeyserverPolicy, ProfileKind};
use proptest::prelude::*;

fn arb_routed_kind() -> impl Strategy<Value = ProfileKind> {
    prop_oneof![
        Just(ProfileKind::Tor),
        Just(ProfileKind::AnonymizationService),
        Just(ProfileKind::Custom),
    ]
}

fn arb_policy() -> impl Strategy<Value = KeyserverPolicy> {
    prop_oneof![
        Just(KeyserverPolicy::Tor),
        Just(KeyserverPolicy::AnonymizationService),
    ]
}

proptest! {
    /// The hidden-key-id string is the plain string with one flag inserted.
    #[test]
    fn hide_key_id_inserts_single_flag(kind in arb_routed_kind()) {
        let plain = keyserver_args(kind, false).unwrap();
        let hidden = keyserver_args(kind, true).unwrap();

        let plain_words: Vec<&str> = plain.split(' ').collect();
        let hidden_words: Vec<&str> = hidden.split(' ').collect();
        prop_assert_eq!(hidden_words.len(), plain_words.len() + 1);

        let at = hidden_words.iter().position(|w| *w == "--throw-keyids").unwrap();
        prop_assert_eq!(hidden_words[at - 1], "--no-comments");
        prop_assert_eq!(hidden_words[at + 1], "--display-charset");

        let mut without = hidden_words.clone();
        without.remove(at);
        prop_assert_eq!(without, plain_words);
    }

    /// Same inputs, same bytes.
    #[test]
    fn builder_is_deterministic(policy in arb_policy(), hide in any::<bool>()) {
        prop_assert_eq!(policy.build(hide), policy.build(hide));
        prop_assert_eq!(policy.arguments(hide).join(" "), policy.build(hide));
    }

    /// Only the policy tail differs between networks.
    #[test]
    fn policies_share_flag_prefix(hide in any::<bool>()) {
        let tor = KeyserverPolicy::Tor.build(hide);
        let service = KeyserverPolicy::AnonymizationService.build(hide);
        let prefix_len = if hide { 4 } else { 3 };
        let tor_prefix: Vec<&str> = tor.split(' ').take(prefix_len + 1).collect();
        let service_prefix: Vec<&str> = service.split(' ').take(prefix_len + 1).collect();
        prop_assert_eq!(tor_prefix, service_prefix);
        prop_assert!(tor.contains("hkp://2eghzlv2wwcq7u7y.onion"));
        prop_assert!(!service.contains("--keyserver hkp"));
    }
}
