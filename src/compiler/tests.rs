use super::*;
use crate::stream::SeekMode;
use crate::value::ByteOrder;

#[test]
fn resolves_backreference_to_slot_index() {
    let spec = StructSpec::new()
        .field("len", ReaderSpec::uint(8))
        .field("pad", ReaderSpec::uint(8))
        .field("data", ReaderSpec::bytes("len"));
    let program = Compiler::compile(&spec).unwrap();
    assert_eq!(program.len(), 3);
    match &program.ops()[2] {
        Op::Bytes {
            len: Source::Ref { index, path },
        } => {
            assert_eq!(*index, 0);
            assert!(path.is_empty());
        }
        other => panic!("expected bytes op with reference, got {other:?}"),
    }
}

#[test]
fn forward_reference_is_unresolved() {
    let spec = StructSpec::new()
        .field("data", ReaderSpec::bytes("len"))
        .field("len", ReaderSpec::uint(8));
    let err = Compiler::compile(&spec).unwrap_err();
    assert!(matches!(err, Error::UnresolvedReference { name } if name == "len"));
}

#[test]
fn self_reference_is_unresolved() {
    let spec = StructSpec::new().field("data", ReaderSpec::bytes("data"));
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::UnresolvedReference { .. })
    ));
}

#[test]
fn duplicate_field_rejected() {
    let spec = StructSpec::new()
        .field("a", ReaderSpec::uint(8))
        .field("a", ReaderSpec::uint(16));
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::DuplicateField { name }) if name == "a"
    ));
}

#[test]
fn seek_slot_is_anonymous() {
    let spec = StructSpec::new()
        .field("_", ReaderSpec::seek(4, SeekMode::Start))
        .field("v", ReaderSpec::uint(8));
    let program = Compiler::compile(&spec).unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program.names()[0], None);
    assert_eq!(program.names()[1].as_deref(), Some("v"));
}

#[test]
fn seek_name_does_not_shadow() {
    // The seek's name is dropped, so a later field may reuse it.
    let spec = StructSpec::new()
        .field("v", ReaderSpec::seek(1, SeekMode::Start))
        .field("v", ReaderSpec::uint(8));
    assert!(Compiler::compile(&spec).is_ok());
}

#[test]
fn nested_struct_compiles_with_fresh_name_table() {
    let inner = StructSpec::new()
        .field("n", ReaderSpec::uint(8))
        .field("body", ReaderSpec::bytes("n"));
    let spec = StructSpec::new()
        .field("n", ReaderSpec::uint(16))
        .field("inner", ReaderSpec::Struct(inner));
    let program = Compiler::compile(&spec).unwrap();
    match &program.ops()[1] {
        Op::Struct(sub) => {
            assert_eq!(sub.len(), 2);
            // Inner `n` resolves to the inner frame's slot 0, not the outer field.
            match &sub.ops()[1] {
                Op::Bytes {
                    len: Source::Ref { index, .. },
                } => assert_eq!(*index, 0),
                other => panic!("unexpected inner op {other:?}"),
            }
        }
        other => panic!("expected nested program, got {other:?}"),
    }
}

#[test]
fn reference_does_not_cross_frames() {
    let inner = StructSpec::new().field("body", ReaderSpec::bytes("outer_len"));
    let spec = StructSpec::new()
        .field("outer_len", ReaderSpec::uint(8))
        .field("inner", ReaderSpec::Struct(inner));
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::UnresolvedReference { name }) if name == "outer_len"
    ));
}

#[test]
fn invalid_integer_widths_rejected() {
    for bits in [0, 12, 72] {
        let spec = StructSpec::new().field("v", ReaderSpec::uint(bits));
        assert!(
            matches!(Compiler::compile(&spec), Err(Error::Program { .. })),
            "width {bits} should be rejected"
        );
    }
}

#[test]
fn invalid_float_width_rejected() {
    let spec = StructSpec::new().field("v", ReaderSpec::float(16));
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::Program { .. })
    ));
}

#[test]
fn empty_match_table_rejected() {
    let spec = StructSpec::new()
        .field("t", ReaderSpec::uint(8))
        .field("v", ReaderSpec::match_on("t", vec![]));
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::Program { .. })
    ));
}

#[test]
fn peek_of_seek_rejected() {
    let spec = StructSpec::new().field(
        "p",
        ReaderSpec::peek(ReaderSpec::seek(0, SeekMode::Start)),
    );
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::Program { .. })
    ));
}

#[test]
fn unknown_encoding_label_rejected() {
    let spec = StructSpec::new().field("s", ReaderSpec::string_as(4, "no-such-encoding"));
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::UnknownEncoding { label }) if label == "no-such-encoding"
    ));
}

#[test]
fn explicit_order_survives_lowering() {
    let spec = StructSpec::new().field("v", ReaderSpec::uint_be(32));
    let program = Compiler::compile(&spec).unwrap();
    match &program.ops()[0] {
        Op::Int { bits, signed, order } => {
            assert_eq!(*bits, 32);
            assert!(!signed);
            assert_eq!(*order, Some(ByteOrder::Big));
        }
        other => panic!("unexpected op {other:?}"),
    }
}

#[test]
fn dotted_reference_resolves_head_and_keeps_projection() {
    let pair = StructSpec::new()
        .field("a", ReaderSpec::uint(8))
        .field("b", ReaderSpec::uint(8));
    let spec = StructSpec::new()
        .field("p", ReaderSpec::Struct(pair))
        .field("data", ReaderSpec::bytes("p.a"));
    let program = Compiler::compile(&spec).unwrap();
    match &program.ops()[1] {
        Op::Bytes {
            len: Source::Ref { index, path },
        } => {
            assert_eq!(*index, 0);
            assert_eq!(path, &["a".to_string()]);
        }
        other => panic!("unexpected op {other:?}"),
    }
}

#[test]
fn dotted_reference_with_unknown_head_is_unresolved() {
    let spec = StructSpec::new().field("data", ReaderSpec::bytes("p.a"));
    assert!(matches!(
        Compiler::compile(&spec),
        Err(Error::UnresolvedReference { name }) if name == "p.a"
    ));
}

#[test]
fn inline_source_lowers_to_inline_op() {
    let spec = StructSpec::new().field("data", ReaderSpec::bytes(ReaderSpec::uint(8)));
    let program = Compiler::compile(&spec).unwrap();
    match &program.ops()[0] {
        Op::Bytes {
            len: Source::Inline(op),
        } => assert!(matches!(**op, Op::Int { bits: 8, .. })),
        other => panic!("unexpected op {other:?}"),
    }
}
