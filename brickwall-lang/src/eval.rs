//! Implements executing compiled templates against a brick wall.
//!
//! Execution walks the top level statements in order. Every field declaration places a brick
//! at a cursor that starts at [`ExecOptions::start_offset`] and advances by the size of each
//! placed field. Expressions read the values of previously placed fields from the view.

use brickwall_common::{BrickWall, Endianness};
use tracing::info;

use crate::ir::CompiledTemplate;

pub use diagnostics::{ExecError, ExecErrorKind, ExecReport};
pub use value::Value;
pub use view::View;

mod diagnostics;
mod exec;
mod value;
mod view;

/// Configures a single execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    /// The offset of the first field.
    pub start_offset: i64,
    /// The byte order used to read values.
    pub endianness: Endianness,
}

/// Executes `template` against `view` with the default options, adding bricks to `wall`.
pub fn execute(
    template: &CompiledTemplate,
    wall: &mut BrickWall,
    view: &View<'_>,
) -> Result<ExecReport, ExecError> {
    execute_with(template, wall, view, ExecOptions::default())
}

/// Executes `template` against `view`, adding bricks to `wall`.
///
/// Bricks the wall refuses are collected in [`ExecReport::rejected`] without aborting. On
/// error `wall` is left unchanged.
pub fn execute_with(
    template: &CompiledTemplate,
    wall: &mut BrickWall,
    view: &View<'_>,
    options: ExecOptions,
) -> Result<ExecReport, ExecError> {
    let mut executor = exec::Executor::new(template, view, options, wall.clone());
    executor.run()?;

    let (scratch, report) = executor.finish();
    *wall = scratch;

    info!(
        placed = report.placed,
        rejected = report.rejected.len(),
        structs = report.structs_defined,
        end = report.end_offset,
        "executed template"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use brickwall_common::{Brick, InsertError, PrimitiveType, TypeId};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compile::compile;

    fn run(src: &str, data: &[u8]) -> Result<(BrickWall, ExecReport), ExecError> {
        run_with(src, data, ExecOptions::default())
    }

    fn run_with(
        src: &str,
        data: &[u8],
        options: ExecOptions,
    ) -> Result<(BrickWall, ExecReport), ExecError> {
        let template = compile(src).unwrap();
        let mut wall = BrickWall::new();
        let report = execute_with(&template, &mut wall, &View::Bytes(data), options)?;

        Ok((wall, report))
    }

    fn layout(wall: &BrickWall) -> Vec<(&str, i64, u64)> {
        wall.bricks()
            .iter()
            .map(|brick| (brick.name.as_str(), brick.start, brick.size))
            .collect()
    }

    #[test]
    fn fields_are_placed_consecutively() {
        let (wall, report) = run(
            "uint32 magic;\nuint16 len;\nchar[3] tag;",
            b"\x01\0\0\0\x02\0abc",
        )
        .unwrap();

        assert_eq!(layout(&wall), [("magic", 0, 4), ("len", 4, 2), ("tag", 6, 3)]);
        assert_eq!(
            wall.bricks()[0].type_id,
            TypeId::primitive(PrimitiveType::UInt32)
        );
        assert_eq!(report.placed, 3);
        assert_eq!(report.end_offset, 9);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn counts_read_earlier_fields() {
        let (wall, _) = run("uint8 n;\nuint8[n] data;\nuint8 tail;", &[3, 10, 11, 12, 9]).unwrap();
        assert_eq!(layout(&wall), [("n", 0, 1), ("data", 1, 3), ("tail", 4, 1)]);

        let (wall, _) = run("uint8 n;\nuint16[n * 2 - 1] data;", &[2, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(layout(&wall), [("n", 0, 1), ("data", 1, 6)]);
    }

    #[test]
    fn structs_are_defined_and_instantiated() {
        let src = "struct Header { uint16 magic; uint16 len; }\nHeader hdr;\nuint8[hdr.len] payload;";
        let (wall, report) = run(src, &[0x42, 0x4d, 2, 0, 0xaa, 0xbb]).unwrap();

        assert_eq!(report.structs_defined, 1);
        assert_eq!(wall.structs().len(), 1);

        let header = &wall.structs()[0];
        assert_eq!(header.name.as_str(), "Header");
        assert_eq!(header.size(), 4);
        let members: Vec<_> = header
            .members()
            .iter()
            .map(|member| (member.name.as_str(), member.start, member.size))
            .collect();
        assert_eq!(members, [("magic", 0, 2), ("len", 2, 2)]);

        assert_eq!(layout(&wall), [("hdr", 0, 4), ("payload", 4, 2)]);
        let hdr = &wall.bricks()[0];
        assert_eq!(hdr.struct_def, wall.struct_by_name("Header"));
        assert_eq!(hdr.color, header.color);
    }

    #[test]
    fn struct_arrays_and_nested_structs() {
        let src = "struct P { uint8 x; uint8 y; }\nstruct Line { P from; P to; }\nP[3] points;\nLine line;";
        let (wall, _) = run(src, &[0; 10]).unwrap();

        assert_eq!(layout(&wall), [("points", 0, 6), ("line", 6, 4)]);
        let line = wall.struct_def(wall.struct_by_name("Line").unwrap()).unwrap();
        assert_eq!(line.size(), 4);
        assert_eq!(line.members()[1].struct_def, wall.struct_by_name("P"));
    }

    #[test]
    fn element_access_reads_the_element() {
        let (wall, _) = run("uint8[3] sizes;\nuint8[sizes[2]] data;", &[1, 2, 3, 0, 0, 0]).unwrap();
        assert_eq!(layout(&wall), [("sizes", 0, 3), ("data", 3, 3)]);

        let src = "struct T { uint16[2] n; }\nT t;\nuint8[t.n[1]] data;";
        let (wall, _) = run(src, &[9, 0, 2, 0, 0, 0]).unwrap();
        assert_eq!(layout(&wall), [("t", 0, 4), ("data", 4, 2)]);
    }

    #[test]
    fn endianness_and_start_offset_are_honored() {
        let options = ExecOptions {
            start_offset: 2,
            endianness: Endianness::Big,
        };
        let (wall, report) = run_with(
            "uint16 n;\nuint8[n] data;",
            &[0xff, 0xff, 0, 2, 1, 2],
            options,
        )
        .unwrap();

        assert_eq!(layout(&wall), [("n", 2, 2), ("data", 4, 2)]);
        assert_eq!(report.end_offset, 6);
    }

    #[test]
    fn empty_fields_are_skipped() {
        let (wall, report) = run("uint8 n;\nuint8[n] data;\nuint8 tail;", &[0, 7]).unwrap();

        assert_eq!(layout(&wall), [("n", 0, 1), ("tail", 1, 1)]);
        assert_eq!(report.placed, 2);
    }

    #[test]
    fn overlapping_bricks_are_reported() {
        let template = compile("uint16 a;\nuint16 b;").unwrap();
        let mut wall = BrickWall::new();
        assert!(wall.insert_brick(Brick::new(
            "existing",
            TypeId::primitive(PrimitiveType::UInt8),
            1,
            1,
            0
        )));

        let report = execute(&template, &mut wall, &View::Bytes(&[0; 4])).unwrap();

        assert_eq!(report.placed, 1);
        assert_eq!(
            report.rejected,
            [InsertError::Overlap {
                new: "a".into(),
                existing: "existing".into(),
            }]
        );
        assert_eq!(layout(&wall), [("existing", 1, 1), ("b", 2, 2)]);
    }

    #[test]
    fn failed_execution_leaves_the_wall_unchanged() {
        let template = compile("uint8 a;\nstruct S { uint8 x; }\nuint8[10] b;").unwrap();
        let mut wall = BrickWall::new();

        let err = execute(&template, &mut wall, &View::Bytes(&[0; 4])).unwrap_err();

        assert_eq!(err.line, 3);
        assert!(matches!(
            err.kind,
            ExecErrorKind::OutOfBounds {
                start: 1,
                end: 11,
                len: 4,
                ..
            }
        ));
        assert!(wall.bricks().is_empty());
        assert!(wall.structs().is_empty());
    }

    #[test]
    fn reexecution_reuses_struct_definitions() {
        let template = compile("struct S { uint8 x; }\nS s;").unwrap();
        let mut wall = BrickWall::new();
        let data = [0; 4];

        for start_offset in [0, 2] {
            let options = ExecOptions {
                start_offset,
                ..ExecOptions::default()
            };
            execute_with(&template, &mut wall, &View::Bytes(&data), options).unwrap();
        }

        assert_eq!(wall.structs().len(), 1);
        assert_eq!(layout(&wall), [("s", 0, 1), ("s", 2, 1)]);
    }

    #[test]
    fn arithmetic_errors_abort() {
        let err = run("uint8[1 - 2] x;", &[0; 4]).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::NegativeCount(-1)));

        let err = run("uint8 n;\nuint8[4 / n] x;", &[0; 4]).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::DivisionByZero));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn reads_are_checked() {
        let err = run("uint8[2] a;\nuint8[a[2]] b;", &[1, 1, 0, 0]).unwrap_err();
        assert!(matches!(
            err.kind,
            ExecErrorKind::IndexOutOfRange { index: 2, count: 2, .. }
        ));

        let err = run("uint64 big;\nuint8[big] data;", &[0xff; 8]).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::ValueOutOfRange(u64::MAX)));
    }

    #[test]
    fn execution_works_on_inputs() {
        let input = brickwall_common::Input::from_bytes(vec![2, 0, 0]);
        let template = compile("uint8 n;\nuint8[n] rest;").unwrap();
        let mut wall = BrickWall::new();

        execute(&template, &mut wall, &View::from(&input)).unwrap();

        assert_eq!(layout(&wall), [("n", 0, 1), ("rest", 1, 2)]);
    }
}
