use serde_json::{json, Value};
use stash_core::types::Field;
use stash_core::{
    parse_document_str, resolve_config, DocumentFormat, MergeError, ResolvedConfig,
    ResolvedSnapshot, SecretMap, StashConfig,
};

fn load(yaml: &str) -> StashConfig {
    parse_document_str(yaml, DocumentFormat::Yaml)
        .unwrap()
        .document
        .stash_config
}

fn resolve(yaml: &str) -> ResolvedConfig {
    resolve_config(&load(yaml), &SecretMap::new(), false).unwrap()
}

const RETRY_A: &str = "{ Attempts: 2, BackoffStrategy: fixed, BackoffSeconds: 1 }";
const RETRY_B: &str = "{ Attempts: 5, BackoffStrategy: exponential, BackoffSeconds: 0.5 }";

fn retry_config(root: Option<&str>, defaults: Option<&str>, request: Option<&str>) -> String {
    let line = |indent: &str, v: Option<&str>| match v {
        Some(v) => format!("{indent}Retry: {v}\n"),
        None => String::new(),
    };
    format!(
        "StashConfig:\n  Name: r\n{}  Defaults:\n    URLRoot: http://x\n{}  Sequences:\n    - Name: s\n      Type: Sequential\n      Requests:\n        - a:\n            Method: GET\n            URLPath: /a\n{}",
        line("  ", root),
        line("    ", defaults),
        line("            ", request),
    )
}

#[test]
fn retry_closest_declared_level_wins() {
    let options = [None, Some("null"), Some(RETRY_A), Some(RETRY_B)];
    for root in options {
        for defaults in options {
            for request in options {
                let cfg = resolve(&retry_config(root, defaults, request));
                let got = &cfg.sequences[0].requests[0].retry;
                let expected = request.or(defaults).or(root);
                match expected {
                    None => assert_eq!(got, &Field::Unset),
                    Some("null") => assert_eq!(got, &Field::Null),
                    Some(v) if v == RETRY_A => {
                        assert_eq!(got.value().map(|p| p.attempts), Some(2))
                    }
                    Some(_) => assert_eq!(got.value().map(|p| p.attempts), Some(5)),
                }
            }
        }
    }
}

#[test]
fn explicit_null_on_request_beats_defaults_policy() {
    let cfg = resolve(&retry_config(None, Some(RETRY_B), Some("null")));
    let req = &cfg.sequences[0].requests[0];
    assert_eq!(req.retry, Field::Null);
    assert!(req.retry_policy().is_none());
}

#[test]
fn forced_retry_overrides_all_levels() {
    let yaml = format!(
        "{}  Forced:\n    Retry: null\n",
        retry_config(None, Some(RETRY_A), Some(RETRY_B))
    );
    let cfg = resolve(&yaml);
    assert_eq!(cfg.sequences[0].requests[0].retry, Field::Null);
}

#[test]
fn sections_fall_back_to_defaults_then_forced_overlays() {
    let cfg = resolve(
        r#"
StashConfig:
  Name: m
  Defaults:
    URLRoot: http://x
    Headers: { Accept: application/json, X-Default: d }
    Query: { page: 1 }
  Forced:
    Headers: { X-Trace: forced, Accept: text/plain }
    Body: { source: stash }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - own:
            Method: POST
            URLPath: /own
            Headers: { X-Own: o }
            Body: { id: 7 }
        - inherit:
            Method: GET
            URLPath: /inherit
"#,
    );
    let own = &cfg.sequences[0].requests[0];
    let block = own.snapshot_block();
    assert_eq!(block["Headers"], json!({"X-Own": "o", "X-Trace": "forced", "Accept": "text/plain"}));
    assert_eq!(block["Body"], json!({"id": 7, "source": "stash"}));
    assert_eq!(block["Query"], json!({"page": 1}));

    let inherit = &cfg.sequences[0].requests[1];
    let block = inherit.snapshot_block();
    assert_eq!(
        block["Headers"],
        json!({"Accept": "text/plain", "X-Default": "d", "X-Trace": "forced"})
    );
    assert_eq!(block["Body"], json!({"source": "stash"}));
}

#[test]
fn forced_values_are_expanded_after_overlay() {
    let cfg = resolve(
        r#"
StashConfig:
  Name: m
  Defaults: { URLRoot: http://x }
  Forced:
    Headers: { X-Request-Id: "${hex:12}" }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a: { Method: GET, URLPath: /a }
"#,
    );
    let block = cfg.sequences[0].requests[0].snapshot_block();
    let id = block["Headers"]["X-Request-Id"].as_str().unwrap();
    assert_eq!(id.len(), 12);
    assert!(!id.contains("${"));
}

#[test]
fn flow_tls_and_response_use_request_then_defaults() {
    let cfg = resolve(
        r#"
StashConfig:
  Name: f
  Defaults:
    URLRoot: http://x
    FlowControl: { DelaySeconds: 2, TimeoutSeconds: 30 }
    InsecureTLS: true
    Response: { PrettyPrint: true }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a:
            Method: GET
            URLPath: /a
            FlowControl: { TimeoutSeconds: 5 }
            InsecureTLS: false
            Response: { Sort: true }
        - b: { Method: GET, URLPath: /b }
"#,
    );
    let a = &cfg.sequences[0].requests[0];
    assert_eq!(a.delay_seconds(), 2.0);
    assert_eq!(a.timeout_seconds(), Some(5.0));
    assert!(!a.insecure_tls);
    assert!(a.response.as_ref().unwrap().sort());

    let b = &cfg.sequences[0].requests[1];
    assert!(b.insecure_tls);
    assert!(b.response.as_ref().unwrap().pretty());
    assert_eq!(b.timeout_seconds(), Some(30.0));
}

#[test]
fn plain_requests_round_trip_with_only_stamped_fields_added() {
    let cfg = resolve(
        r#"
StashConfig:
  Name: rt
  Defaults: { URLRoot: "http://x/" }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a:
            Method: PUT
            URLPath: /things/1
            Headers: { X-A: "1" }
            Body: { nested: { list: [1, 2, { k: v }] }, flag: true }
            Query: { q: search }
"#,
    );
    let block = cfg.sequences[0].requests[0].snapshot_block();
    assert_eq!(
        block,
        json!({
            "Method": "PUT",
            "URLRoot": "http://x/",
            "URLPath": "/things/1",
            "Headers": {"X-A": "1"},
            "Body": {"nested": {"list": [1, 2, {"k": "v"}]}, "flag": true},
            "Query": {"q": "search"}
        })
    );
}

#[test]
fn request_time_markers_stay_deferred_until_materialized() {
    let yaml = r#"
StashConfig:
  Name: d
  Defaults: { URLRoot: http://x }
  Dynamics:
    Patterns: { nonce: "N-${alphanumeric:10}" }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a:
            Method: POST
            URLPath: /a
            Headers:
              X-Sent-At: { $func: timestamp, format: epoch_ms, when: request }
            Body:
              nonce: { $dynamic: nonce, when: request }
              fixed: { $dynamic: nonce }
"#;
    let cfg = resolve(yaml);
    let req = &cfg.sequences[0].requests[0];
    assert!(req.has_deferred());

    let snapshot = req.snapshot_block();
    assert!(snapshot["Headers"]["X-Sent-At"].get("$deferred").is_some());
    assert!(snapshot["Body"]["nonce"].get("$deferred").is_some());
    assert!(snapshot["Body"]["fixed"].as_str().unwrap().starts_with("N-"));

    let first = req.materialize(&SecretMap::new()).unwrap();
    let second = req.materialize(&SecretMap::new()).unwrap();
    let rendered = serde_json::to_string(&req.materialized_block(&first)).unwrap();
    assert!(!rendered.contains("$deferred"));
    assert!(first.headers.as_ref().unwrap()["X-Sent-At"].is_i64());

    let body1 = first.body.unwrap();
    let body2 = second.body.unwrap();
    assert_eq!(body1["fixed"], body2["fixed"]);
    assert_eq!(body1["nonce"].as_str().unwrap().len(), 12);
}

#[test]
fn resolve_time_dynamic_is_shared_across_requests() {
    let cfg = resolve(
        r#"
StashConfig:
  Name: d
  Defaults:
    URLRoot: http://x
    Body: { run: { $dynamic: runId } }
  Dynamics:
    Patterns: { runId: "${uuidv4}" }
  Sequences:
    - Name: one
      Type: Sequential
      Requests:
        - a: { Method: POST, URLPath: /a }
    - Name: two
      Type: Concurrent
      ConcurrencyLimit: 1
      Requests:
        - b: { Method: POST, URLPath: /b }
"#,
    );
    let a = cfg.sequences[0].requests[0].snapshot_block();
    let b = cfg.sequences[1].requests[0].snapshot_block();
    assert_eq!(a["Body"]["run"], b["Body"]["run"]);
}

#[test]
fn configuration_errors_carry_the_request_path() {
    let yaml = r#"
StashConfig:
  Name: e
  Defaults: { URLRoot: http://x }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a:
            Method: GET
            URLPath: /a
            Headers: { Authorization: "Bearer ${secrets:TOKEN}" }
"#;
    let err = resolve_config(&load(yaml), &SecretMap::new(), false).unwrap_err();
    assert_eq!(err.path(), "Sequences[0].Requests[0].a.Headers.Authorization");
    assert!(matches!(err, MergeError::Dynamic { .. }));

    let deferred = yaml.replace(
        r#"{ Authorization: "Bearer ${secrets:TOKEN}" }"#,
        "{ Authorization: { $secrets: TOKEN, when: request } }",
    );
    let secrets: SecretMap = [("OTHER", "x")].into_iter().collect();
    assert!(resolve_config(&load(&deferred), &secrets, false).is_err());
}

#[test]
fn blank_url_root_is_rejected() {
    let yaml = r#"
StashConfig:
  Name: e
  Defaults: { URLRoot: "  " }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a: { Method: GET, URLPath: /a }
"#;
    let err = resolve_config(&load(yaml), &SecretMap::new(), false).unwrap_err();
    assert!(matches!(err, MergeError::MissingUrlRoot { .. }));
}

#[test]
fn redacted_snapshot_never_contains_secret_values() {
    let yaml = r#"
StashConfig:
  Name: s
  Defaults:
    URLRoot: http://x
    Headers:
      Authorization: "Bearer ${secrets:TOKEN}"
      X-Inline: "{ $secrets: TOKEN }"
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a:
            Method: POST
            URLPath: /a
            Body: { key: { $secrets: TOKEN } }
"#;
    let secrets: SecretMap = [("TOKEN", "tok-9f8e7d")].into_iter().collect();
    let cfg = resolve_config(&load(yaml), &secrets, false).unwrap();

    let live = cfg.sequences[0].requests[0].materialize(&secrets).unwrap();
    assert_eq!(live.headers.as_ref().unwrap()["Authorization"], "Bearer tok-9f8e7d");
    assert_eq!(live.body.as_ref().unwrap()["key"], "tok-9f8e7d");

    let snapshot = ResolvedSnapshot::new(&cfg);
    let unredacted = serde_json::to_string(snapshot.as_value()).unwrap();
    assert!(unredacted.contains("tok-9f8e7d"));

    let yaml_out = snapshot.to_yaml(&secrets.redactor()).unwrap();
    assert!(!yaml_out.contains("tok-9f8e7d"));
    assert!(yaml_out.contains("***REDACTED***"));

    let redacted = resolve_config(&load(yaml), &secrets, true).unwrap();
    let block = redacted.sequences[0].requests[0].snapshot_block();
    assert_eq!(block["Headers"]["Authorization"], "Bearer ***REDACTED***");
}

#[test]
fn snapshot_blocks_can_be_replaced_in_place() {
    let cfg = resolve(&retry_config(None, None, None));
    let mut snapshot = ResolvedSnapshot::new(&cfg);
    assert!(snapshot.set_request_block(0, 0, json!({"Method": "GET", "done": true})));
    assert!(!snapshot.set_request_block(3, 0, Value::Null));
    assert_eq!(
        snapshot.as_value()["StashConfig"]["Sequences"][0]["Requests"][0]["a"]["done"],
        true
    );
}
