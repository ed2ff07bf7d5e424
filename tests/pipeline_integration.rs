//! Pipeline integration tests
//!
//! Tests for the processor through the public library API, from YAML
//! configuration to transformed metrics.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;

use strings_processor::codec::{format_line, parse_line};
use strings_processor::config::Config;
use strings_processor::metric::{FieldValue, Metric, MetricAdapter};
use strings_processor::runner;
use strings_processor::transformer::{Rule, RuleSet, StringsProcessor, Transform};

/// Build a processor from a YAML document
fn processor_from_yaml(yaml: &str) -> StringsProcessor {
    let config = Config::from_yaml_str(yaml).expect("Failed to parse config");
    StringsProcessor::new(config.strings)
}

fn single(rule: Rule) -> StringsProcessor {
    StringsProcessor::from_rules(RuleSet::from_rules(vec![rule]))
}

fn field_value(processor: &StringsProcessor, input: &str) -> FieldValue {
    let mut metric = Metric::new("m").with_field("v", input);
    processor.process(&mut metric);
    metric.fields["v"].clone()
}

/// Metric backed by hash maps, whose iteration order is unspecified
#[derive(Debug, Default)]
struct HashMetric {
    name: String,
    tags: HashMap<String, String>,
    fields: HashMap<String, FieldValue>,
}

impl MetricAdapter for HashMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn tags(&self) -> Vec<(String, String)> {
        self.tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    fn add_tag(&mut self, key: String, value: String) {
        self.tags.insert(key, value);
    }

    fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    fn fields(&self) -> Vec<(String, FieldValue)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    fn add_field(&mut self, key: String, value: FieldValue) {
        self.fields.insert(key, value);
    }

    fn remove_field(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }
}

// ==========================================================================
// Batch invariants
// ==========================================================================

#[test]
fn test_batch_count_and_order_preserved() {
    let processor = processor_from_yaml(
        r#"
strings:
  uppercase:
    - measurement: "*"
"#,
    );

    let input: Vec<Metric> = (0..50)
        .map(|i| Metric::new(format!("m{}", i)).with_field("seq", i as i64))
        .collect();
    let output = processor.apply(input);

    assert_eq!(output.len(), 50);
    for (i, metric) in output.iter().enumerate() {
        assert_eq!(metric.name, format!("M{}", i));
        assert_eq!(metric.fields["seq"], FieldValue::Integer(i as i64));
    }
}

#[test]
fn test_empty_batch() {
    let processor = processor_from_yaml("strings:\n  lowercase:\n    - tag: \"*\"\n");
    let output: Vec<Metric> = processor.apply(Vec::new());
    assert!(output.is_empty());
}

#[test]
fn test_compile_twice_is_identical() {
    let yaml = r#"
strings:
  replace:
    - tag: path
      old: "/"
      new: "."
  lowercase:
    - field: "*"
"#;
    let first = processor_from_yaml(yaml);
    let second = processor_from_yaml(yaml);

    assert_eq!(first.compile(), second.compile());
    assert_eq!(first.compile(), first.compile());

    let metric = Metric::new("req")
        .with_tag("path", "/a/b")
        .with_field("Status", "OK");
    let a = first.apply(vec![metric.clone()]);
    let b = first.apply(vec![metric.clone()]);
    let c = second.apply(vec![metric]);
    assert_eq!(a, b);
    assert_eq!(a, c);
}

// ==========================================================================
// Transform properties
// ==========================================================================

#[test]
fn test_replace_to_empty_keeps_original() {
    let processor = single(
        Rule::new(Transform::Replace {
            old: "foo".to_string(),
            new: String::new(),
        })
        .with_field("v"),
    );
    assert_eq!(field_value(&processor, "foo"), FieldValue::from("foo"));
    assert_eq!(field_value(&processor, "foobar"), FieldValue::from("bar"));
}

#[test]
fn test_left_truncates() {
    let processor = single(Rule::new(Transform::Left { width: 3 }).with_field("v"));
    assert_eq!(field_value(&processor, "hello"), FieldValue::from("hel"));
    assert_eq!(field_value(&processor, "hi"), FieldValue::from("hi"));
}

#[test]
fn test_base64_decode() {
    let processor = single(Rule::new(Transform::Base64Decode).with_field("v"));
    assert_eq!(field_value(&processor, "aGVsbG8="), FieldValue::from("hello"));
    assert_eq!(
        field_value(&processor, "not-base64!"),
        FieldValue::from("not-base64!")
    );
}

#[test]
fn test_trim_with_and_without_cutset() {
    let whitespace = single(Rule::new(Transform::Trim { cutset: None }).with_field("v"));
    assert_eq!(field_value(&whitespace, "  pad  "), FieldValue::from("pad"));

    let cutset = single(
        Rule::new(Transform::Trim {
            cutset: Some("x".to_string()),
        })
        .with_field("v"),
    );
    assert_eq!(field_value(&cutset, "xxpadxx"), FieldValue::from("pad"));
}

// ==========================================================================
// Wildcard passes over an arbitrary adapter
// ==========================================================================

#[test]
fn test_wildcard_field_key_independent_of_iteration_order() {
    let processor = single(Rule::new(Transform::Uppercase).with_field_key("*"));

    let mut metric = HashMetric {
        name: "m".to_string(),
        ..HashMetric::default()
    };
    metric.add_field("a".to_string(), FieldValue::Integer(1));
    metric.add_field("b".to_string(), FieldValue::Integer(2));

    processor.process(&mut metric);

    let mut fields = metric.fields();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        fields,
        vec![
            ("A".to_string(), FieldValue::Integer(1)),
            ("B".to_string(), FieldValue::Integer(2)),
        ]
    );
}

#[test]
fn test_wildcard_rename_to_empty_skips_only_that_key() {
    let processor = single(
        Rule::new(Transform::TrimPrefix {
            prefix: "x".to_string(),
        })
        .with_field_key("*"),
    );

    let mut metric = HashMetric::default();
    metric.add_field("x".to_string(), FieldValue::Integer(1));
    metric.add_field("xa".to_string(), FieldValue::Integer(2));
    metric.add_field("xb".to_string(), FieldValue::Integer(3));

    processor.process(&mut metric);

    assert_eq!(metric.get_field("x"), Some(&FieldValue::Integer(1)));
    assert_eq!(metric.get_field("a"), Some(&FieldValue::Integer(2)));
    assert_eq!(metric.get_field("b"), Some(&FieldValue::Integer(3)));
    assert_eq!(metric.fields.len(), 3);
}

#[test]
fn test_wildcard_tags_over_hash_metric() {
    let processor = processor_from_yaml(
        r#"
strings:
  lowercase:
    - tag_key: "*"
  trim:
    - tag: "*"
"#,
    );

    let mut metric = HashMetric::default();
    for (key, value) in [("Host", " web01 "), ("Region", "eu "), ("ENV", " prod")] {
        metric.add_tag(key.to_string(), value.to_string());
    }

    processor.process(&mut metric);

    assert_eq!(metric.get_tag("host"), Some("web01"));
    assert_eq!(metric.get_tag("region"), Some("eu"));
    assert_eq!(metric.get_tag("env"), Some("prod"));
    assert_eq!(metric.tags.len(), 3);
}

// ==========================================================================
// End to end
// ==========================================================================

#[test]
fn test_realistic_configuration() {
    let processor = processor_from_yaml(
        r#"
strings:
  lowercase:
    - tag: method
    - field_key: "*"
  titlecase:
    - field: agent
  trim_suffix:
    - measurement: "*"
      suffix: "_total"
  left:
    - field: path
      dest: short_path
      width: 4
  base64decode:
    - field: payload
"#,
    );

    let metric = parse_line(
        r#"http_requests_total,method=GET Agent="curl tool",Path="/api/users",Payload="b2s=",Count=3i 1"#,
    )
    .unwrap();
    let output = processor.apply(vec![metric]);

    // Field keys are lowercased before the later groups look them up
    assert_eq!(
        format_line(&output[0]).unwrap(),
        r#"http_requests,method=get agent="Curl Tool",count=3i,path="/api/users",payload="ok",short_path="/api" 1"#
    );
}

#[test]
fn test_runner_end_to_end() {
    let config = Config::from_yaml_str(
        r#"
output_format: json
batch_size: 2
strings:
  replace:
    - measurement: "*"
      old: "."
      new: "_"
"#,
    )
    .unwrap();
    let processor = StringsProcessor::new(config.strings.clone());

    let input = "# comment\nsys.cpu v=1i\n\nsys.mem v=2i\nsys.disk v=3i\n";
    let mut output = Vec::new();
    let summary = runner::run(&config, &processor, Cursor::new(input), &mut output).unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.batches, 2);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        concat!(
            r#"{"name":"sys_cpu","tags":{},"fields":{"v":1}}"#,
            "\n",
            r#"{"name":"sys_mem","tags":{},"fields":{"v":2}}"#,
            "\n",
            r#"{"name":"sys_disk","tags":{},"fields":{"v":3}}"#,
            "\n",
        )
    );
}

#[test]
fn test_invalid_utf8_input_is_replaced() {
    let config = Config::default();
    let processor = StringsProcessor::default();

    let mut input = b"log msg=\"bad ".to_vec();
    input.extend_from_slice(&[0xff, 0xfe]);
    input.extend_from_slice(b" bytes\"\n");
    let mut output = Vec::new();

    runner::run(&config, &processor, Cursor::new(input), &mut output).unwrap();

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "log msg=\"bad \u{FFFD} bytes\"\n"
    );
}

#[test]
fn test_shared_across_threads() {
    let processor = Arc::new(processor_from_yaml(
        "strings:\n  uppercase:\n    - tag: \"*\"\n",
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let processor = Arc::clone(&processor);
            thread::spawn(move || {
                let metric = Metric::new("m")
                    .with_tag("id", format!("node{}", i))
                    .with_field("v", 1i64);
                processor.apply(vec![metric])
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let output = handle.join().expect("worker panicked");
        assert_eq!(output[0].tags["id"], format!("NODE{}", i));
    }
    assert_eq!(processor.compile().len(), 1);
}
