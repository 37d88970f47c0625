//! Strict-mode conformance: the grammar accepted and rejected by the
//! default parser, and exact value semantics at the boundaries.

use jsondom::{parse, ErrorKind, ParseOptions, Value};
use test_case::test_case;

#[test]
fn zero_is_an_integer() {
    let v = parse("0").unwrap();
    assert!(v.is_int());
    assert_eq!(v.as_int().unwrap(), 0);
}

#[test]
fn minus_zero_is_a_float() {
    let v = parse("-0.0").unwrap();
    assert!(v.is_float());
    assert_eq!(v.as_float().unwrap(), 0.0);
    assert!(v.as_float().unwrap().is_sign_negative());
}

#[test]
fn int64_bounds_stay_integers() {
    let v = parse("-9223372036854775808").unwrap();
    assert!(v.is_int());
    assert_eq!(v.as_int().unwrap(), i64::MIN);

    let v = parse("9223372036854775807").unwrap();
    assert!(v.is_int());
    assert_eq!(v.as_int().unwrap(), i64::MAX);
}

#[test]
fn just_above_int64_max_is_uint() {
    let v = parse("9223372036854775808").unwrap();
    assert!(v.is_uint());
    assert_eq!(v.as_uint().unwrap(), 9_223_372_036_854_775_808);
}

#[test_case("1e-308", 1e-308)]
#[test_case("1e308", 1e308)]
#[test_case("1e+2", 100.0)]
#[test_case("2.5e-1", 0.25)]
fn float_magnitudes(input: &str, expected: f64) {
    let v = parse(input).unwrap();
    assert!(v.is_float());
    assert_eq!(v.as_float().unwrap(), expected);
}

#[test]
fn empty_string() {
    let v = parse("\"\"").unwrap();
    assert_eq!(v.as_str().unwrap(), "");
}

#[test]
fn null_byte_via_escape() {
    let v = parse(r#""a\u0000b""#).unwrap();
    assert_eq!(v.as_str().unwrap(), "a\0b");
    assert_eq!(v.as_str().unwrap().len(), 3);
}

#[test]
fn all_standard_escapes() {
    let v = parse(r#""\"\\\/\b\f\n\r\t""#).unwrap();
    assert_eq!(v.as_str().unwrap(), "\"\\/\u{8}\u{c}\n\r\t");
}

#[test]
fn quotes_and_backslashes_in_content() {
    let v = parse(r#""say \"hello\" path\\to\\file""#).unwrap();
    assert_eq!(v.as_str().unwrap(), "say \"hello\" path\\to\\file");
}

#[test]
fn long_strings_survive_intact() {
    let body = "abcdefghij".repeat(1000);
    let v = parse(&format!("\"{body}\"")).unwrap();
    assert_eq!(v.as_str().unwrap(), body);
}

#[test]
fn every_control_char_via_escape() {
    for c in 0u32..0x20 {
        let input = format!("\"\\u{c:04x}\"");
        let v = parse(&input).unwrap();
        let expected: String = char::from_u32(c).unwrap().to_string();
        assert_eq!(v.as_str().unwrap(), expected, "control 0x{c:02x}");
    }
}

#[test]
fn control_chars_round_trip_through_dump() {
    for c in 0u32..0x20 {
        let input = format!("\"\\u{c:04x}\"");
        let first = parse(&input).unwrap();
        let second = parse(&first.dump(-1)).unwrap();
        assert_eq!(first, second, "control 0x{c:02x}");
    }
}

#[test]
fn del_byte_passes_through_unescaped() {
    let v = parse("\"a\u{7f}b\"").unwrap();
    assert_eq!(v.as_str().unwrap(), "a\u{7f}b");
    assert_eq!(v.dump(-1), "\"a\u{7f}b\"");
}

#[test]
fn direct_utf8_and_escapes_agree() {
    assert_eq!(parse("\"Привет мир\"").unwrap().as_str().unwrap(), "Привет мир");
    assert_eq!(parse(r#""\u0041\u0042""#).unwrap().as_str().unwrap(), "AB");
    assert_eq!(parse(r#""\uD83D\uDE00""#).unwrap().as_str().unwrap(), "😀");
    assert_eq!(
        parse(r#""Hello \u4E16\u754C!""#).unwrap().as_str().unwrap(),
        "Hello 世界!"
    );
}

#[test]
fn escaped_keys_are_unescaped_before_lookup() {
    let v = parse(r#"{"key\twith\ttabs":1,"key\nwith\nnewlines":2}"#).unwrap();
    assert_eq!(v["key\twith\ttabs"].as_int().unwrap(), 1);
    assert_eq!(v["key\nwith\nnewlines"].as_int().unwrap(), 2);
}

#[test]
fn deep_array_of_fifty() {
    let depth = 50;
    let input = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    let v = parse(&input).unwrap();
    let mut cursor = &v;
    for _ in 0..depth {
        assert!(cursor.is_array());
        assert_eq!(cursor.len(), 1);
        cursor = &cursor[0];
    }
    assert_eq!(cursor.as_int().unwrap(), 1);
}

#[test]
fn deep_object_of_fifteen() {
    let depth = 15;
    let input = format!(
        "{}1{}",
        "{\"x\":".repeat(depth),
        "}".repeat(depth)
    );
    let v = parse(&input).unwrap();
    let mut cursor = &v;
    for _ in 0..depth {
        assert!(cursor.contains("x"));
        cursor = &cursor["x"];
    }
    assert_eq!(cursor.as_int().unwrap(), 1);
}

#[test]
fn mixed_nesting_indexes_through() {
    let v = parse(r#"{"a":[{"b":[{"c":1}]}]}"#).unwrap();
    assert_eq!(v["a"][0]["b"][0]["c"].as_int().unwrap(), 1);

    let v = parse(r#"[{"id":1},{"id":2},{"id":3}]"#).unwrap();
    assert_eq!(v.len(), 3);
    assert_eq!(v[0]["id"].as_int().unwrap(), 1);
    assert_eq!(v[2]["id"].as_int().unwrap(), 3);
}

#[test_case(""; "empty input")]
#[test_case("[1,]"; "trailing comma in array")]
#[test_case(r#"{"a":1,}"#; "trailing comma in object")]
#[test_case(r#""open"#; "unterminated string")]
#[test_case("nul"; "clipped null")]
#[test_case("tru"; "clipped true")]
#[test_case("fals"; "clipped false")]
#[test_case("--1"; "double sign")]
#[test_case("1."; "bare dot")]
#[test_case("1e"; "bare exponent")]
#[test_case("null x"; "trailing content")]
#[test_case("01"; "leading zero")]
#[test_case("{1:2}"; "non string key")]
#[test_case("[1 2]"; "missing comma")]
fn strict_mode_rejects(input: &str) {
    assert!(parse(input).is_err(), "{input:?} must not parse");
}

#[test]
fn strict_rejections_parse_under_matching_extensions() {
    let lenient = ParseOptions::lenient();
    assert!(jsondom::parse_with_options("[1,]", &lenient).is_ok());
    assert!(jsondom::parse_with_options(r#"{"a":1,}"#, &lenient).is_ok());
    assert!(jsondom::parse_with_options("// c\n1", &lenient).is_ok());
    assert!(jsondom::parse_with_options("'single'", &lenient).is_ok());
    assert!(jsondom::parse_with_options("{key:1}", &lenient).is_ok());
    assert!(jsondom::parse_with_options("NaN", &lenient).is_ok());
    // Hex stays off until json5.
    assert!(jsondom::parse_with_options("0x10", &lenient).is_err());
    assert!(jsondom::parse_with_options("0x10", &ParseOptions::json5()).is_ok());
}

#[test]
fn duplicate_key_message_names_the_key() {
    let opts = ParseOptions {
        allow_duplicate_keys: false,
        ..ParseOptions::strict()
    };
    let err = jsondom::parse_with_options(r#"{"bssid":1,"bssid":2}"#, &opts).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    assert!(err.message().contains("bssid"));
}

#[test]
fn empty_containers_parse_to_empty_values() {
    assert_eq!(parse("{}").unwrap(), Value::object());
    assert_eq!(parse("[]").unwrap(), Value::array());
    assert_eq!(parse("{}").unwrap().len(), 0);
}
