//! End-to-end parses of representative binary layouts.

use binform::{
    compile_struct, parse_struct, parse_struct_reader, ParseOptions, ReaderSpec, SeekMode,
    SourceSpec, StructSpec, UserFn, Value,
};

fn parse(spec: &StructSpec, data: &[u8]) -> Value {
    parse_struct(spec, data, &ParseOptions::default()).unwrap()
}

#[test]
fn little_endian_pair() {
    let spec = StructSpec::new()
        .field("a", ReaderSpec::uint(16))
        .field("b", ReaderSpec::uint(16));
    let parsed = parse(&spec, &[0x00, 0x01, 0x00, 0x02]);
    assert_eq!(parsed.get("a"), Some(&Value::UInt(0x0100)));
    assert_eq!(parsed.get("b"), Some(&Value::UInt(0x0200)));
}

#[test]
fn length_prefixed_bytes() {
    let spec = StructSpec::new()
        .field("len", ReaderSpec::uint(8))
        .field("data", ReaderSpec::bytes("len"))
        .field("end", ReaderSpec::Pos);
    let parsed = parse(&spec, &[0x03, 0x41, 0x42, 0x43, 0xFF]);
    assert_eq!(parsed.get("len"), Some(&Value::UInt(3)));
    assert_eq!(
        parsed.get("data"),
        Some(&Value::Bytes(vec![0x41, 0x42, 0x43]))
    );
    assert_eq!(parsed.get("end"), Some(&Value::UInt(4)));
}

#[test]
fn varint_then_string() {
    let spec = StructSpec::new()
        .field("n", ReaderSpec::Uvarint)
        .field("s", ReaderSpec::string("n"));
    let parsed = parse(&spec, &[0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F]);
    assert_eq!(parsed.get("n"), Some(&Value::UInt(5)));
    assert_eq!(parsed.get("s"), Some(&Value::Str("hello".to_string())));
}

#[test]
fn match_by_tag() {
    let spec = StructSpec::new()
        .field("t", ReaderSpec::uint(8))
        .field(
            "v",
            ReaderSpec::match_on("t", vec![ReaderSpec::uint(32), ReaderSpec::string(4)]),
        );

    let tagged_int = parse(&spec, &[0x00, 0x01, 0x02, 0x03, 0x04]);
    assert_eq!(tagged_int.get("t"), Some(&Value::UInt(0)));
    assert_eq!(tagged_int.get("v"), Some(&Value::UInt(0x0403_0201)));

    let tagged_str = parse(&spec, &[0x01, 0x41, 0x42, 0x43, 0x44]);
    assert_eq!(tagged_str.get("v"), Some(&Value::Str("ABCD".to_string())));
}

#[test]
fn peek_does_not_consume() {
    let spec = StructSpec::new()
        .field("p", ReaderSpec::peek(ReaderSpec::uint(8)))
        .field("x", ReaderSpec::uint(16));
    let parsed = parse(&spec, &[0xAA, 0xBB]);
    assert_eq!(parsed.get("p"), Some(&Value::UInt(0xAA)));
    assert_eq!(parsed.get("x"), Some(&Value::UInt(0xBBAA)));
}

#[test]
fn seek_then_read() {
    let spec = StructSpec::new()
        .field("_", ReaderSpec::seek(4, SeekMode::Start))
        .field("v", ReaderSpec::uint(8));
    let parsed = parse(&spec, &[0x00, 0x00, 0x00, 0x00, 0x7F]);
    assert_eq!(parsed.get("v"), Some(&Value::UInt(0x7F)));
}

#[test]
fn nested_struct_with_callable() {
    let xor = UserFn::new(|args: &[Value]| {
        let x = args[0].as_int().ok_or("not an integer")?;
        let y = args[1].as_int().ok_or("not an integer")?;
        Ok(Value::Int(x ^ y))
    });
    let pair = StructSpec::new()
        .field("a", ReaderSpec::uint(8))
        .field("b", ReaderSpec::uint(8));
    let spec = StructSpec::new()
        .field("p", ReaderSpec::Struct(pair))
        .field(
            "c",
            ReaderSpec::call(xor, vec![SourceSpec::from("p.a"), SourceSpec::from("p.b")]),
        );
    let parsed = parse(&spec, &[0x0F, 0xF0]);
    assert_eq!(
        parsed.get("p").and_then(|p| p.get("a")),
        Some(&Value::UInt(0x0F))
    );
    assert_eq!(
        parsed.get("p").and_then(|p| p.get("b")),
        Some(&Value::UInt(0xF0))
    );
    assert_eq!(parsed.get("c"), Some(&Value::Int(0xFF)));
}

#[test]
fn reader_entry_matches_slice_entry() {
    let spec = StructSpec::new()
        .field("n", ReaderSpec::Uvarint)
        .field("s", ReaderSpec::string("n"));
    let data = [0x02, 0x68, 0x69];
    let from_slice = parse_struct(&spec, &data, &ParseOptions::default()).unwrap();
    let from_reader =
        parse_struct_reader(&spec, std::io::Cursor::new(data), &ParseOptions::default()).unwrap();
    assert_eq!(from_slice, from_reader);
}

#[test]
fn parses_are_independent() {
    let first = StructSpec::new()
        .field("len", ReaderSpec::uint(8))
        .field("data", ReaderSpec::bytes("len"));
    let second = StructSpec::new().field("v", ReaderSpec::uint(16));

    let program = compile_struct(&second).unwrap();
    let baseline = parse_struct(&program, &[0x01, 0x02], &ParseOptions::default()).unwrap();

    // Running an unrelated parse first must not change the result.
    parse_struct(&first, &[0x02, 0xAA, 0xBB], &ParseOptions::default()).unwrap();
    let after = parse_struct(&program, &[0x01, 0x02], &ParseOptions::default()).unwrap();
    assert_eq!(baseline, after);
}
