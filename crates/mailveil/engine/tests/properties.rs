mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use mailveil_engine::{EngineConfig, MessageBundle, PanelDeps, ProfilePanel};
use mailveil_profiles::{
    keys, AnonymizationVariant, Channel, PrivacyToggles, ProfileKind, ProfileSelection,
    ProxyEndpoint,
};
use mailveil_store::{InMemoryPreferenceStore, PreferenceStore};
use proptest::prelude::*;

use common::{engine_over, Harness, ScriptedPrompt};

fn arb_endpoint() -> impl Strategy<Value = ProxyEndpoint> {
    ("[a-z][a-z0-9-]{0,15}(\\.[a-z0-9]{1,8}){0,3}", 1u16..=u16::MAX)
        .prop_map(|(host, port)| ProxyEndpoint::new(host, port))
}

fn arb_toggles() -> impl Strategy<Value = PrivacyToggles> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(idle, folder, hide)| {
        PrivacyToggles {
            use_server_idle_polling: idle,
            restore_last_folder: folder,
            hide_key_id: hide,
        }
    })
}

fn arb_selection() -> impl Strategy<Value = ProfileSelection> {
    let base = prop_oneof![
        Just(ProfileSelection::tor()),
        Just(ProfileSelection::service(None)),
        Just(ProfileSelection::service(Some(AnonymizationVariant::BuiltinRelay))),
        Just(ProfileSelection::service(Some(AnonymizationVariant::UserDefined))),
        Just(ProfileSelection::transparent()),
        arb_endpoint().prop_map(ProfileSelection::custom),
    ];
    (base, arb_toggles()).prop_map(|(selection, toggles)| selection.with_toggles(toggles))
}

fn expected_shadow_keys(selection: &ProfileSelection) -> BTreeSet<String> {
    let mut expected = BTreeSet::from([keys::USE_IDLE.to_string()]);
    match (selection.kind, selection.effective_variant()) {
        (ProfileKind::Transparent, _) => {
            expected.insert(keys::PROXY_TYPE.to_string());
        }
        (ProfileKind::AnonymizationService, Some(AnonymizationVariant::BuiltinRelay)) => {
            for channel in Channel::ALL {
                expected.insert(channel.host_key().to_string());
                expected.insert(channel.port_key().to_string());
            }
            expected.insert(keys::KEYSERVER_ARGS.to_string());
        }
        (ProfileKind::Custom, _) => {
            expected.insert(keys::SOCKS_HOST.to_string());
            expected.insert(keys::SOCKS_PORT.to_string());
            expected.insert(keys::KEYSERVER_ARGS.to_string());
        }
        _ => {
            expected.insert(keys::KEYSERVER_ARGS.to_string());
        }
    }
    expected
}

proptest! {
    #[test]
    fn shadow_tree_holds_only_the_last_kind(
        history in prop::collection::vec(arb_selection(), 0..4),
        last in arb_selection(),
    ) {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let engine = engine_over(store);
        for selection in &history {
            engine.apply(selection).unwrap();
        }
        engine.apply(&last).unwrap();

        prop_assert_eq!(engine.shadow_keys().unwrap(), expected_shadow_keys(&last));
    }

    #[test]
    fn apply_is_idempotent(selection in arb_selection()) {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let engine = engine_over(store.clone());

        engine.apply(&selection).unwrap();
        let first = store.user_values().unwrap();
        engine.apply(&selection).unwrap();

        prop_assert_eq!(store.user_values().unwrap(), first);
    }

    #[test]
    fn proxy_mode_is_manual_unless_transparent(selection in arb_selection()) {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let engine = engine_over(store.clone());
        engine.apply(&selection).unwrap();

        let expected = if selection.kind == ProfileKind::Transparent { 0 } else { 1 };
        prop_assert_eq!(store.get_int(keys::PROXY_TYPE).unwrap(), Some(expected));
    }

    #[test]
    fn custom_endpoint_survives_load(endpoint in arb_endpoint(), toggles in arb_toggles()) {
        let harness = Harness::new(ScriptedPrompt::answering(true, false));
        let deps: PanelDeps = harness.deps(MessageBundle::english());
        let panel = ProfilePanel::open(&EngineConfig::default(), deps).unwrap().unwrap();

        let selection = ProfileSelection::custom(endpoint.clone()).with_toggles(toggles);
        panel.on_accept(&selection).unwrap();
        let form = panel.on_load().unwrap();

        prop_assert_eq!(form.kind, ProfileKind::Custom);
        prop_assert_eq!(form.endpoint.clone(), Some(endpoint));
        prop_assert_eq!(form.toggles, toggles);
        prop_assert_eq!(form.selection(), selection);
    }
}
