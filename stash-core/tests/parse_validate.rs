use stash_core::types::{Field, SequenceType};
use stash_core::{parse_document_str, validate_config, DocumentFormat, ParseError};

fn minimal_valid_yaml() -> &'static str {
    r#"
StashConfig:
  Name: smoke
  Defaults:
    URLRoot: https://api.example.com
    FlowControl:
      DelaySeconds: 0
      TimeoutSeconds: 10
  Sequences:
    - Name: first
      Type: Sequential
      Requests:
        - ping:
            Method: GET
            URLPath: /ping
"#
}

#[test]
fn parse_yaml_and_validate_ok() {
    let parsed = parse_document_str(minimal_valid_yaml(), DocumentFormat::Yaml).unwrap();
    validate_config(&parsed.document.stash_config).unwrap();
    let sc = &parsed.document.stash_config;
    assert_eq!(sc.name, "smoke");
    assert_eq!(sc.sequences[0].kind, SequenceType::Sequential);
    assert_eq!(sc.sequences[0].requests[0].key, "ping");
}

#[test]
fn parse_auto_detects_yaml() {
    let parsed = parse_document_str(minimal_valid_yaml(), DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Yaml);
}

#[test]
fn parse_auto_detects_json() {
    let json = r#"{"StashConfig": {"Name": "j", "Defaults": {"URLRoot": "http://x"},
        "Sequences": [{"Name": "s", "Type": "Sequential",
        "Requests": [{"a": {"Method": "POST", "URLPath": "/a", "Body": {"k": 1}}}]}]}}"#;
    let parsed = parse_document_str(json, DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Json);
    validate_config(&parsed.document.stash_config).unwrap();
}

#[test]
fn explicit_null_retry_is_kept_apart_from_omission() {
    let yaml = r#"
StashConfig:
  Name: n
  Defaults:
    URLRoot: http://x
    Retry: null
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a: { Method: GET, URLPath: /a }
"#;
    let parsed = parse_document_str(yaml, DocumentFormat::Yaml).unwrap();
    let sc = parsed.document.stash_config;
    assert_eq!(sc.defaults.retry, Field::Null);
    assert_eq!(sc.retry, Field::Unset);
    assert_eq!(sc.sequences[0].requests[0].spec.retry, Field::Unset);
}

#[test]
fn yaml_anchors_and_merge_keys_are_expanded() {
    let yaml = r#"
x-common: &common
  Method: GET
  Headers: { X-Env: test }
StashConfig:
  Name: anchors
  Defaults:
    URLRoot: http://x
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a:
            <<: *common
            URLPath: /a
"#;
    let parsed = parse_document_str(yaml, DocumentFormat::Yaml).unwrap();
    let spec = &parsed.document.stash_config.sequences[0].requests[0].spec;
    assert_eq!(spec.url_path, "/a");
    assert_eq!(spec.headers.as_ref().unwrap()["X-Env"], "test");
    assert!(parsed.document.extra.contains_key("x-common"));
}

#[test]
fn missing_stash_config_wrapper_is_explained() {
    let yaml = "Name: x\nSequences: []\n";
    let err = parse_document_str(yaml, DocumentFormat::Yaml).unwrap_err();
    match err {
        ParseError::MissingRoot(keys) => assert_eq!(keys, vec!["Name", "Sequences"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn request_entries_must_have_one_key() {
    let yaml = r#"
StashConfig:
  Name: n
  Defaults: { URLRoot: http://x }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a: { Method: GET, URLPath: /a }
          b: { Method: GET, URLPath: /b }
"#;
    assert!(parse_document_str(yaml, DocumentFormat::Yaml).is_err());
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = r#"
StashConfig:
  Name: n
  Defaults: { URLRoot: http://x, Bogus: 1 }
  Sequences: []
"#;
    assert!(parse_document_str(yaml, DocumentFormat::Yaml).is_err());
}

#[test]
fn validation_reports_every_violation() {
    let yaml = r#"
StashConfig:
  Name: ""
  Defaults:
    URLRoot: ""
    FlowControl: { DelaySeconds: -1 }
  Sequences:
    - Name: dup
      Type: Concurrent
      Requests:
        - a: { Method: GET, URLPath: /a, Retry: { Attempts: 0, BackoffStrategy: fixed, BackoffSeconds: 1 } }
        - a: { Method: GET, URLPath: /b }
    - Name: dup
      Type: Sequential
      ConcurrencyLimit: 2
      Requests: []
"#;
    let parsed = parse_document_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_config(&parsed.document.stash_config).unwrap_err();
    let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();

    assert!(paths.contains(&"StashConfig.Name"));
    assert!(paths.contains(&"StashConfig.Defaults.URLRoot"));
    assert!(paths.contains(&"StashConfig.Defaults.FlowControl.DelaySeconds"));
    assert!(paths.contains(&"StashConfig.Sequences[0].ConcurrencyLimit"));
    assert!(paths.contains(&"StashConfig.Sequences[0].Requests[0].a.Retry.Attempts"));
    assert!(paths.contains(&"StashConfig.Sequences[0].Requests[1].a"));
    assert!(paths.contains(&"StashConfig.Sequences[1].Name"));
    assert!(paths.contains(&"StashConfig.Sequences[1].ConcurrencyLimit"));
    assert!(paths.contains(&"StashConfig.Sequences[1].Requests"));
}

#[test]
fn durations_beyond_the_representable_range_are_rejected() {
    let yaml = r#"
StashConfig:
  Name: huge
  Defaults:
    URLRoot: http://x
    FlowControl: { DelaySeconds: 1.0e20 }
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a: { Method: GET, URLPath: /a, FlowControl: { TimeoutSeconds: 1.0e20 } }
        - b: { Method: GET, URLPath: /b, FlowControl: { DelaySeconds: 86400, TimeoutSeconds: 30 } }
"#;
    let parsed = parse_document_str(yaml, DocumentFormat::Yaml).unwrap();
    let err = validate_config(&parsed.document.stash_config).unwrap_err();
    let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "StashConfig.Defaults.FlowControl.DelaySeconds",
            "StashConfig.Sequences[0].Requests[0].a.FlowControl.TimeoutSeconds",
        ]
    );
    assert!(err.violations[0].message.contains("too large"));
}

#[test]
fn jitter_accepts_bool_or_full() {
    let yaml = |jitter: &str| {
        format!(
            r#"
StashConfig:
  Name: n
  Defaults:
    URLRoot: http://x
    Retry: {{ Attempts: 3, BackoffStrategy: exponential, BackoffSeconds: 1, Jitter: {jitter} }}
  Sequences:
    - Name: s
      Type: Sequential
      Requests:
        - a: {{ Method: GET, URLPath: /a }}
"#
        )
    };
    for ok in ["true", "false", "full", "FULL"] {
        assert!(parse_document_str(&yaml(ok), DocumentFormat::Yaml).is_ok(), "{ok}");
    }
    assert!(parse_document_str(&yaml("partial"), DocumentFormat::Yaml).is_err());
}
