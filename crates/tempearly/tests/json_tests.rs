//! JSON parsing through `parse_json` and serialization through `as_json`,
//! including cycle safety of the INSPECTING guard.

mod common;

use common::{eval, eval_err, eval_ok};

#[test]
fn parses_scalars() {
    assert_eq!(eval_ok("\"1\".parse_json()"), "1");
    assert_eq!(eval_ok("\"-2\".parse_json()"), "-2");
    assert_eq!(eval_ok("\"2.5\".parse_json()"), "2.5");
    assert_eq!(eval_ok("\"1e3\".parse_json()"), "1000.0");
    assert_eq!(eval_ok("\"true\".parse_json()"), "true");
    assert_eq!(eval_ok("\"false\".parse_json()"), "false");
    assert_eq!(eval("\"null\".parse_json()").unwrap(), None);
    assert_eq!(eval_ok("'\"hi\\\\nthere\"'.parse_json().length()"), "8");
}

#[test]
fn parses_containers() {
    assert_eq!(eval_ok("\"[1, 2, 3]\".parse_json().sum()"), "6");
    assert_eq!(eval_ok("'{\"a\": [1, 2], \"b\": 3}'.parse_json()[\"a\"]"), "1, 2");
    assert_eq!(eval_ok("'{\"a\": 1}'.parse_json().size()"), "1");
    assert_eq!(eval_ok("\"[]\".parse_json().size()"), "0");
    assert_eq!(eval_ok("\"{}\".parse_json().size()"), "0");
}

#[test]
fn parse_errors_raise_value_error() {
    for source in [
        "\"\".parse_json()",
        "\"[1, 2\".parse_json()",
        "\"{\\\"a\\\" 1}\".parse_json()",
        "\"tru\".parse_json()",
        "\"[1,]x\".parse_json()",
    ] {
        let error = eval_err(source);
        assert_eq!(error.class_name, "ValueError", "{source}");
        assert!(!error.message.is_empty(), "{source}");
    }
}

#[test]
fn serializes_values() {
    assert_eq!(eval_ok("[1, \"x\", null, true].as_json()"), "[1,\"x\",null,true]");
    assert_eq!(eval_ok("{\"a\": 1, \"b\": [2]}.as_json()"), "{\"a\":1,\"b\":[2]}");
    assert_eq!(eval_ok("\"a\\\"b\".as_json()"), "\"a\\\"b\"");
    assert_eq!(eval_ok("(1..3).as_json()"), "[1,2,3]");
}

#[test]
fn round_trips_preserve_structure() {
    assert_eq!(
        eval_ok("'{\"k\": [1, {\"n\": null}]}'.parse_json().as_json()"),
        "{\"k\":[1,{\"n\":null}]}"
    );
}

#[test]
fn self_referential_containers_do_not_recurse() {
    // Stringify, hash and serialize a list containing itself; the inner
    // re-entry emits empty content instead of recursing forever.
    assert_eq!(eval_ok("x = []; x.append(x); x.as_json()"), "[[]]");
    assert_eq!(eval_ok("x = []; x.append(x); x.join()"), "");
    assert!(eval("x = []; x.append(x); x.__hash__()").is_ok());
    assert_eq!(eval_ok("m = {}; m[\"self\"] = m; m.as_json()"), "{\"self\":{}}");
    assert!(eval("m = {}; m[\"self\"] = m; m.join()").is_ok());
}
