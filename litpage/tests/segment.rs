use litpage::{Combination, LineKind, LiterateError, Segment, SegmentKind, segment};

fn kinds(segments: &[Segment]) -> Vec<SegmentKind> {
    segments.iter().map(|s| s.kind).collect()
}

const SAMPLE: &[&str] = &[
    "# {\"title\": \"T\"}",
    "",
    "# Some prose",
    "# over two lines.",
    "",
    "x = 1",
    "",
    "print(x)",
    "",
    "",
    "# More prose.",
    "#$",
    "not run",
    "",
    "still listing",
    "#$",
    "# trailing prose",
    "   ",
];

#[test]
fn lines_are_classified_by_prefix() {
    assert_eq!(LineKind::classify("# hello"), LineKind::Prose);
    assert_eq!(LineKind::classify("#$"), LineKind::NoExecFlag);
    assert_eq!(LineKind::classify("#$ skip"), LineKind::NoExecFlag);
    assert_eq!(LineKind::classify(""), LineKind::Blank);
    assert_eq!(LineKind::classify(" \t "), LineKind::Blank);
    assert_eq!(LineKind::classify("x = 1"), LineKind::Code);
    // A bare comment without the space is code (a code comment).
    assert_eq!(LineKind::classify("#comment"), LineKind::Code);
    assert_eq!(LineKind::classify("  # indented"), LineKind::Code);
}

#[test]
fn combination_table() {
    use SegmentKind::*;
    assert_eq!(Prose.combine(Prose), Some(Prose));
    assert_eq!(Code.combine(Code), Some(Code));
    assert_eq!(Code.combine(Blank), Some(Code));
    assert_eq!(Blank.combine(Blank), Some(Blank));
    assert_eq!(NoExecFlag.combine(Code), Some(NonExecutableCode));
    assert_eq!(NonExecutableCode.combine(Code), Some(NonExecutableCode));
    assert_eq!(NonExecutableCode.combine(Blank), Some(NonExecutableCode));

    assert_eq!(Prose.combine(Code), None);
    assert_eq!(Blank.combine(Code), None);
    assert_eq!(Prose.combine(Blank), None);
    assert_eq!(Blank.combine(Prose), None);
    assert_eq!(Code.combine(Prose), None);
    assert_eq!(NoExecFlag.combine(Prose), None);
    assert_eq!(NoExecFlag.combine(Blank), None);
    assert_eq!(NoExecFlag.combine(NoExecFlag), None);
    assert_eq!(NonExecutableCode.combine(NoExecFlag), None);
    assert_eq!(Stdout.combine(Stdout), None);
    assert_eq!(Stdout.combine(Code), None);
    assert_eq!(Code.combine(Stdout), None);
}

#[test]
fn segments_follow_the_source() {
    let segments = segment(SAMPLE.iter()).unwrap();
    use SegmentKind::*;
    assert_eq!(
        kinds(&segments),
        vec![
            Prose,
            Blank,
            Prose,
            Blank,
            Code,
            Prose,
            NonExecutableCode,
            NoExecFlag,
            Prose,
            Blank
        ]
    );
    assert_eq!(segments[1].start_line, 2);
    assert_eq!(segments[2].content(), "Some prose\nover two lines.");
    assert_eq!(segments[3].start_line, 5);
    assert_eq!(segments[4].start_line, 6);
    assert_eq!(segments[4].content(), "x = 1\n\nprint(x)\n\n");
    assert_eq!(segments[6].content(), "not run\n\nstill listing");
    assert_eq!(segments[7].content(), "");
}

#[test]
fn concatenated_lines_reproduce_the_input() {
    let segments = segment(SAMPLE.iter()).unwrap();
    let rebuilt: Vec<&str> = segments
        .iter()
        .flat_map(|s| s.lines.iter().map(String::as_str))
        .collect();
    assert_eq!(rebuilt, SAMPLE);

    // Line numbers tile the input with no gaps.
    let mut expected_start = 1;
    for s in &segments {
        assert_eq!(s.start_line, expected_start);
        expected_start = s.end_line() + 1;
    }
    assert_eq!(expected_start, SAMPLE.len() + 1);
}

#[test]
fn adjacent_segments_never_combine() {
    let segments = segment(SAMPLE.iter()).unwrap();
    for pair in segments.windows(2) {
        match pair[0].clone().combine(pair[1].clone()) {
            Combination::Boundary { finished, next } => {
                assert_eq!(finished, pair[0]);
                assert_eq!(next, pair[1]);
            }
            Combination::Merged(merged) => {
                panic!("{} and {} should not merge: {:?}", pair[0].kind, pair[1].kind, merged)
            }
        }
    }
}

#[test]
fn line_terminators_are_stripped() {
    let segments = segment(["# {}\n", "a = 1\r\n", "b = 2"]).unwrap();
    assert_eq!(segments[1].lines, vec!["a = 1", "b = 2"]);
    assert_eq!(segments[1].content(), "a = 1\nb = 2");
}

#[test]
fn blank_lines_join_code_but_prose_splits_it() {
    let joined = segment(["x = 1", "", "y = 2"]).unwrap();
    assert_eq!(kinds(&joined), vec![SegmentKind::Code]);
    assert_eq!(joined[0].content(), "x = 1\n\ny = 2");

    let split = segment(["x = 1", "# between", "y = 2"]).unwrap();
    assert_eq!(
        kinds(&split),
        vec![SegmentKind::Code, SegmentKind::Prose, SegmentKind::Code]
    );
}

#[test]
fn code_runs_start_with_code() {
    let segments = segment(["# {}", "# p", "", "x = 1"]).unwrap();
    assert_eq!(
        kinds(&segments),
        vec![SegmentKind::Prose, SegmentKind::Blank, SegmentKind::Code]
    );
    assert_eq!(segments[1].start_line, 3);
    assert_eq!(segments[2].start_line, 4);
    assert_eq!(segments[2].lines, vec!["x = 1"]);
    assert_eq!(segments[2].render(), "<pre>x = 1</pre>");
}

#[test]
fn no_exec_flag_at_end_of_file_is_empty() {
    let segments = segment(["# {}", "#$"]).unwrap();
    assert_eq!(kinds(&segments), vec![SegmentKind::Prose, SegmentKind::NoExecFlag]);
    assert_eq!(segments[1].content(), "");
    assert_eq!(segments[1].render(), "");
}

#[test]
fn no_exec_flag_only_applies_to_code_directly_below() {
    let segments = segment(["#$", "", "x = 1"]).unwrap();
    assert_eq!(
        kinds(&segments),
        vec![SegmentKind::NoExecFlag, SegmentKind::Blank, SegmentKind::Code]
    );
}

#[test]
fn empty_input_is_an_error() {
    let lines: [&str; 0] = [];
    assert!(matches!(segment(lines), Err(LiterateError::EmptyInput)));
}

#[test]
fn segments_render_by_kind() {
    let prose = Segment::new(
        SegmentKind::Prose,
        vec!["# <b>bold</b> &".into(), "# more".into()],
        1,
    );
    assert_eq!(prose.render(), "<p>\n<b>bold</b> &\nmore\n</p>");

    let code = Segment::new(SegmentKind::Code, vec!["if a < b { x = \"&\" }  ".into()], 1);
    assert_eq!(
        code.render(),
        "<pre>if a &lt; b { x = &quot;&amp;&quot; }</pre>"
    );

    let listing = Segment::new(
        SegmentKind::NonExecutableCode,
        vec!["#$".into(), "print(1)".into()],
        1,
    );
    assert_eq!(listing.render(), "<pre>print(1)</pre>");

    let stdout = Segment::stdout("<1>\n", 1);
    assert_eq!(stdout.render(), "<pre># stdout\n&lt;1&gt;\n</pre>");
    assert_eq!(Segment::stdout("", 1).render(), "");

    let blank = Segment::new(SegmentKind::Blank, vec!["".into(), " ".into()], 1);
    assert_eq!(blank.render(), "");
    let empty_prose = Segment::new(SegmentKind::Prose, vec!["# ".into()], 1);
    assert_eq!(empty_prose.render(), "");
}
