//! Property-based tests for URL composition, request dispatch and v1 reply splitting.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use serde_json::{json, Value};

use hue_core::compose::{compose_path, compose_url, single_segment};
use hue_core::{
    Envelope, HttpMethod, HttpRequest, HttpResponse, RequestBuilder, Transport, TransportError,
};

// ============================================================================
// Helpers
// ============================================================================

fn resource_type_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z_]{0,15}"
}

fn resource_id_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9][a-f0-9-]{0,35}"
}

fn host_strategy() -> impl Strategy<Value = String> {
    (1u8..255, 0u8..255, 0u8..255, 1u8..255).prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}"))
}

fn method_strategy() -> impl Strategy<Value = HttpMethod> {
    prop_oneof![
        Just(HttpMethod::Get),
        Just(HttpMethod::Post),
        Just(HttpMethod::Put),
        Just(HttpMethod::Delete),
    ]
}

#[derive(Default)]
struct Counting {
    sent: Mutex<Vec<HttpRequest>>,
}

impl Transport for Counting {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: br#"{"errors":[],"data":[]}"#.to_vec(),
        })
    }
}

// ============================================================================
// URL composition
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn typed_paths_are_lowercase_and_clean(
        rtype in resource_type_strategy(),
        id in proptest::option::of(resource_id_strategy()),
    ) {
        let path = compose_path("v2", Some(&rtype), id.as_deref()).unwrap();
        let expected = match &id {
            Some(id) => format!("/clip/v2/resource/{}/{id}", rtype.to_lowercase()),
            None => format!("/clip/v2/resource/{}", rtype.to_lowercase()),
        };
        prop_assert_eq!(&path, &expected);
        prop_assert!(!path.contains("//"));
    }

    #[test]
    fn untyped_path_is_version_root(version in "v[0-9]{1,2}") {
        let path = compose_path(&version, None, None).unwrap();
        prop_assert_eq!(path, format!("/clip/{version}/"));
    }

    #[test]
    fn composed_url_keeps_host(host in host_strategy(), rtype in resource_type_strategy()) {
        let url = compose_url(&host, "v2", Some(&rtype), None).unwrap();
        prop_assert_eq!(url.scheme(), "https");
        prop_assert_eq!(url.host_str(), Some(host.as_str()));
        prop_assert!(url.path().starts_with("/clip/v2/resource/"));
    }

    #[test]
    fn accepted_ids_stay_one_level_below_their_type(id in "[a-z0-9./%\\\\?#-]{1,16}") {
        if let Ok(path) = compose_path("v2", Some("light"), Some(&id)) {
            let rest = path.strip_prefix("/clip/v2/resource/light/").unwrap();
            prop_assert!(!rest.is_empty());
            prop_assert!(!rest.contains('/'));
            prop_assert!(rest != "." && rest != "..");
            prop_assert_eq!(single_segment("id", &id).unwrap(), rest);
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn each_execute_sends_exactly_one_request(
        method in method_strategy(),
        rtype in resource_type_strategy(),
        key in "[A-Za-z0-9]{8,40}",
        times in 1usize..4,
    ) {
        let transport = Arc::new(Counting::default());
        let builder = RequestBuilder::new("192.168.1.2")
            .method(method)
            .resource_type(&rtype)
            .application_key(&key)
            .transport(transport.clone());

        for _ in 0..times {
            builder.execute().unwrap();
        }

        let sent = transport.sent.lock().unwrap();
        prop_assert_eq!(sent.len(), times);
        for request in sent.iter() {
            prop_assert_eq!(request.method, method);
            prop_assert_eq!(request.header("hue-application-key"), Some(key.as_str()));
        }
    }
}

// ============================================================================
// v1 reply splitting
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn v1_status_lists_split_by_kind(kinds in proptest::collection::vec(any::<bool>(), 1..10)) {
        let entries: Vec<Value> = kinds
            .iter()
            .enumerate()
            .map(|(i, ok)| {
                if *ok {
                    json!({"success": {format!("/lights/{i}/state/on"): true}})
                } else {
                    json!({"error": {"type": 201, "address": format!("/lights/{i}"), "description": format!("failure {i}")}})
                }
            })
            .collect();
        let body = serde_json::to_vec(&entries).unwrap();
        let envelope = Envelope::from_v1_slice(&body).unwrap();

        let successes = kinds.iter().filter(|ok| **ok).count();
        prop_assert_eq!(envelope.data().as_array().unwrap().len(), successes);
        prop_assert_eq!(envelope.errors().len(), kinds.len() - successes);
        prop_assert_eq!(envelope.has_errors(), successes < kinds.len());
    }
}
