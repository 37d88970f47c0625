//! Round-trip laws: serialize-then-parse and parse-then-serialize both
//! preserve structure, across every value kind and at the numeric
//! boundaries.

use jsondom::{parse, Array, Object, SerializeOptions, Value};
use test_case::test_case;

fn assert_value_round_trips(value: &Value) {
    let compact = value.dump(-1);
    assert_eq!(&parse(&compact).unwrap(), value, "compact {compact}");
    let pretty = value.dump(2);
    assert_eq!(&parse(&pretty).unwrap(), value, "pretty {pretty}");
}

#[test_case("null")]
#[test_case("true")]
#[test_case("42")]
#[test_case("3.14")]
#[test_case("\"hello\"")]
#[test_case(r#"[1,"two",true,null,3.14]"#)]
#[test_case(r#"{"a":1,"b":"x","c":[]}"#)]
#[test_case(r#"{"name":"Тест","nested":{"arr":[1,2],"emoji":"😀"}}"#)]
fn parse_dump_parse_is_identity(input: &str) {
    let first = parse(input).unwrap();
    let second = parse(&first.dump(-1)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn constructed_values_round_trip() {
    let mut object = Object::new();
    object.insert("null", ());
    object.insert("bool", false);
    object.insert("int", -123456789i64);
    object.insert("uint", u64::MAX);
    object.insert("float", 0.1 + 0.2);
    object.insert("short", "sso");
    object.insert("long", "a string that spills out of the inline buffer");
    object.insert("unicode", "héllo 世界 😀");
    let mut array = Array::new();
    array.push(Value::from(object));
    array.push(Value::array());
    array.push(Value::object());
    assert_value_round_trips(&Value::from(array));
}

#[test]
fn integer_boundaries_survive_with_exact_kind() {
    for i in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX - 1, i64::MAX] {
        let v = parse(&Value::from(i).dump(-1)).unwrap();
        assert!(v.is_int(), "{i}");
        assert_eq!(v.as_int().unwrap(), i);
    }
    for u in [i64::MAX as u64 + 1, u64::MAX - 1, u64::MAX] {
        let v = parse(&Value::from(u).dump(-1)).unwrap();
        assert!(v.is_uint(), "{u}");
        assert_eq!(v.as_uint().unwrap(), u);
    }
}

#[test]
fn float_shortest_form_reparses_exactly() {
    for f in [
        0.1_f64 + 0.2,
        1.0 / 3.0,
        95.5,
        37.7749295,
        1e-308,
        1.7976931348623157e308,
        5e-324,
    ] {
        let dumped = Value::from(f).dump(-1);
        let reparsed = parse(&dumped).unwrap();
        assert_eq!(
            reparsed.as_float().unwrap().to_bits(),
            f.to_bits(),
            "{f} via {dumped}"
        );
    }
}

#[test]
fn famous_sum_serializes_shortest() {
    let dumped = Value::from(0.1 + 0.2).dump(-1);
    assert_eq!(dumped, "0.30000000000000004");
    assert_eq!(parse(&dumped).unwrap(), Value::from(0.1 + 0.2));
}

#[test]
fn surrogate_pair_bytes_round_trip() {
    let v = parse(r#""😀""#).unwrap();
    assert_eq!(v.as_str().unwrap().as_bytes(), [0xF0, 0x9F, 0x98, 0x80]);
    let opts = SerializeOptions {
        ensure_ascii: true,
        ..SerializeOptions::compact()
    };
    assert_eq!(v.dump_with(&opts), r#""\ud83d\ude00""#);
    assert_eq!(parse(&v.dump_with(&opts)).unwrap(), v);
}

#[test]
fn pretty_dump_is_idempotent() {
    let v = parse(r#"{"name":"John","layers":[{"a":[1,2,3]},{"b":{}}],"active":true}"#).unwrap();
    let once = v.dump(2);
    let again = parse(&once).unwrap().dump(2);
    assert_eq!(once, again);
}

#[test]
fn compact_serialization_of_parsed_message_is_byte_identical() {
    let input = r#"{"name":"John","age":30,"active":true,"score":95.5}"#;
    assert_eq!(parse(input).unwrap().dump(-1), input);
}

#[test]
fn ensure_ascii_and_sorted_output_reparse_to_the_same_tree() {
    let v = parse(r#"{"z":"末尾","a":[1.5,"😀"],"m":{"k2":2,"k1":1}}"#).unwrap();
    let opts = SerializeOptions {
        ensure_ascii: true,
        sort_keys: true,
        indent: 4,
        ..SerializeOptions::compact()
    };
    let text = v.dump_with(&opts);
    assert!(text.is_ascii());
    assert_eq!(parse(&text).unwrap(), v);
}

#[test]
fn object_equality_is_insertion_order_independent_after_reparse() {
    let a = parse(r#"{"x":1,"y":2}"#).unwrap();
    let b = parse(r#"{"y":2,"x":1}"#).unwrap();
    assert_eq!(a, b);
    assert_ne!(a.dump(-1), b.dump(-1));
    let opts = SerializeOptions {
        sort_keys: true,
        ..SerializeOptions::compact()
    };
    assert_eq!(a.dump_with(&opts), b.dump_with(&opts));
}

#[test]
fn large_object_round_trips_with_index_intact() {
    let entries: Vec<String> = (0..200).map(|i| format!("\"key{i:03}\":{i}")).collect();
    let input = format!("{{{}}}", entries.join(","));
    let v = parse(&input).unwrap();
    assert_eq!(v.len(), 200);
    let reparsed = parse(&v.dump(2)).unwrap();
    for i in 0..200 {
        assert_eq!(
            reparsed[format!("key{i:03}").as_str()].as_int().unwrap(),
            i as i64
        );
    }
}
