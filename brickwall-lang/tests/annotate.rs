use brickwall_common::{BrickWall, Endianness, Input, PrimitiveType, TypeId};
use brickwall_lang::{
    CompileError, Compiler, ExecErrorKind, ExecOptions, View, compile, execute, execute_with,
};
use pretty_assertions::assert_eq;

const GIF_HEADER: &str = "
// logical screen of a GIF image
struct ScreenDescriptor {
    uint16 width;
    uint16 height;
    uint8 flags;
    uint8 background;
    uint8 aspect;
}

char[3] signature;
char[3] version;
ScreenDescriptor screen;
{
    // the global color table holds 2^(n+1) entries of three bytes
    uint8[3 * 2 * 2] color_table;
}
uint8 terminator
";

fn layout(wall: &BrickWall) -> Vec<(String, i64, u64)> {
    wall.bricks()
        .iter()
        .map(|brick| (brick.name.to_string(), brick.start, brick.size))
        .collect()
}

#[test]
fn annotates_a_header() {
    let template = compile(GIF_HEADER).unwrap();
    let mut data = b"GIF89a".to_vec();
    data.extend_from_slice(&[2, 0, 1, 0, 0x80, 0, 0]);
    data.extend_from_slice(&[0; 12]);
    data.push(0x3b);

    let input = Input::from_bytes(data);
    let mut wall = BrickWall::new();
    let report = execute(&template, &mut wall, &View::from(&input)).unwrap();

    assert_eq!(
        layout(&wall),
        [
            ("signature".to_owned(), 0, 3),
            ("version".to_owned(), 3, 3),
            ("screen".to_owned(), 6, 7),
            ("color_table".to_owned(), 13, 12),
            ("terminator".to_owned(), 25, 1),
        ]
    );
    assert_eq!(report.end_offset, 26);
    assert_eq!(
        wall.bricks()[0].type_id,
        TypeId::primitive(PrimitiveType::Char)
    );
    assert_eq!(wall.get_brick(8).map(|brick| brick.name.as_str()), Some("screen"));
}

#[test]
fn two_templates_share_a_wall() {
    let mut compiler = Compiler::new();
    let header = compiler.compile("uint32 magic;\nuint32 count;").unwrap();
    let entries = compiler
        .compile("struct Entry { uint16 id; uint16 len; }\nEntry[2] entries;")
        .unwrap();

    let data = [0u8; 16];
    let mut wall = BrickWall::new();
    execute(&header, &mut wall, &View::Bytes(&data)).unwrap();
    let report = execute_with(
        &entries,
        &mut wall,
        &View::Bytes(&data),
        ExecOptions {
            start_offset: 8,
            endianness: Endianness::Little,
        },
    )
    .unwrap();

    assert_eq!(report.placed, 1);
    assert_eq!(
        layout(&wall),
        [
            ("magic".to_owned(), 0, 4),
            ("count".to_owned(), 4, 4),
            ("entries".to_owned(), 8, 8),
        ]
    );

    // running the header again only produces rejections
    let report = execute(&header, &mut wall, &View::Bytes(&data)).unwrap();
    assert_eq!(report.placed, 0);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(wall.bricks().len(), 3);
}

#[test]
fn errors_name_their_line() {
    let cases = [
        ("uint8 a;\nuint8 b\n@", "line 3: unrecognized character '@'"),
        ("uint8 a;\n{ uint8 b;", "line 2: unterminated block opened on line 2"),
        ("uint8 a;\nstruct { uint8 b; }", "line 2: expected a name after `struct`, found `{`"),
        ("uint8 a;\n\nwhile (a) { uint8 b; }", "line 3: `while` cannot be executed yet"),
        ("uint8 a;\nunknown b;", "line 2: unknown type `unknown`"),
    ];

    for (src, message) in cases {
        let err = compile(src).unwrap_err();
        assert_eq!(err.to_string(), message, "{src:?}");
        assert!(matches!(
            err,
            CompileError::Lex(_) | CompileError::Parse(_) | CompileError::Semantic(_)
        ));
    }
}

#[test]
fn execution_errors_keep_the_wall() {
    let template = compile("uint8 n;\nuint32[n] values;").unwrap();
    let mut wall = BrickWall::new();

    let err = execute(&template, &mut wall, &View::Bytes(&[4, 0, 0, 0])).unwrap_err();

    assert_eq!(err.line, 2);
    assert!(matches!(err.kind, ExecErrorKind::OutOfBounds { .. }));
    assert_eq!(
        err.to_string(),
        "line 2: `values` covers bytes 1..17, but the input has 4 bytes"
    );
    assert!(wall.bricks().is_empty());
}
