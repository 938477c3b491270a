//! Exact wire output for the rules in `ido::format`.

use ido::scan::{next_token, object_span, tokens};
use ido::{from_slice, from_str, to_string};

ido::record! {
    #[derive(Debug, Default, PartialEq)]
    struct Person {
        name: String,
        age: u32,
        active: bool,
    }
}

ido::record! {
    #[derive(Debug, Default, PartialEq)]
    struct Wide {
        a: u8,
        b: String,
        c: bool,
        d: Vec<u8>,
        e: Option<i32>,
        f: f32,
        g: i64,
    }
}

ido::record! {
    #[derive(Debug, Default, PartialEq)]
    struct Masked {
        visible: u8,
        #[ido(skip)]
        hidden: String,
        tail: u8,
    }
}

#[test]
fn test_concrete_example() {
    let person = Person {
        name: "Jo\"e".to_string(),
        age: 0,
        active: true,
    };
    assert_eq!(to_string(&person).unwrap(), r#"{"Jo\"e",,+}"#);
    assert_eq!(from_str::<Person>(r#"{"Jo\"e",,+}"#).unwrap(), person);
}

#[test]
fn test_zero_suppression_writes_n_minus_one_separators() {
    assert_eq!(to_string(&Person::default()).unwrap(), "{,,}");
    assert_eq!(to_string(&Wide::default()).unwrap(), "{,,,,,,}");
}

#[test]
fn test_exclusion_never_appears_on_the_wire() {
    let masked = Masked {
        visible: 1,
        hidden: "do-not-send".to_string(),
        tail: 2,
    };
    let ido = to_string(&masked).unwrap();
    assert_eq!(ido, "{1,2}");

    let back: Masked = from_slice(b"{1,2,\"extra\"}").unwrap();
    assert_eq!(back.hidden, "");
    assert_eq!(back.tail, 2);
}

#[test]
fn test_escaping_symmetry() {
    for original in ["\"", "\\", "\\\"", "a\\\"b\\\\c\"", "end\\", ""] {
        let person = Person {
            name: original.to_string(),
            age: 1,
            active: false,
        };
        let ido = to_string(&person).unwrap();
        let back: Person = from_str(&ido).unwrap();
        assert_eq!(back.name, original, "encoded as {ido}");
    }
}

#[test]
fn test_escape_sequences_on_the_wire() {
    let person = Person {
        name: r#"a"b\c"#.to_string(),
        age: 2,
        active: false,
    };
    assert_eq!(to_string(&person).unwrap(), r#"{"a\"b\\c",2,}"#);
}

#[test]
fn test_scalar_forms() {
    let wide = Wide {
        a: 255,
        b: "x".to_string(),
        c: true,
        d: vec![0, 1],
        e: Some(-5),
        f: 0.5,
        g: -9_000_000_000,
    };
    assert_eq!(
        to_string(&wide).unwrap(),
        r#"{255,"x",+,[0,1],-5,0.5,-9000000000}"#
    );
}

#[test]
fn test_missing_trailing_fields_keep_defaults() {
    let wide: Wide = from_str("{7}").unwrap();
    assert_eq!(
        wide,
        Wide {
            a: 7,
            ..Wide::default()
        }
    );
    let empty: Wide = from_str("{}").unwrap();
    assert_eq!(empty, Wide::default());
}

#[test]
fn test_boundary_scan_with_nested_quoting() {
    let input = br#"{"a,b\"}c",1}"#;
    assert_eq!(object_span(input), Some(0..input.len()));

    let body = &input[1..input.len() - 1];
    let parts: Vec<&[u8]> = tokens(body).collect::<Result<_, _>>().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], br#""a,b\"}c""#);
}

#[test]
fn test_next_token_advance_includes_separator() {
    let (token, advance) = next_token(br#""x,y",2"#).unwrap();
    assert_eq!(token, br#""x,y""#);
    assert_eq!(advance, 6);

    let (token, advance) = next_token(b"last").unwrap();
    assert_eq!(token, b"last");
    assert_eq!(advance, 4);
}

#[test]
fn test_whitespace_only_has_no_boundary() {
    assert_eq!(object_span(b""), None);
    assert_eq!(object_span(b" \n\t "), None);
}
