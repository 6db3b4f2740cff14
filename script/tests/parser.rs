use script::ast::{BinaryOperator, Expression, Statement, TemplateStringPart};
use script::parser::Parser;

fn parse(source: &str) -> Vec<Statement> {
    Parser::new(source).parse().expect("parse failed").statements
}

fn parse_err(source: &str) -> String {
    Parser::new(source)
        .parse()
        .expect_err("expected a parse error")
        .message
}

#[test]
fn assignment_and_call() {
    let stmts = parse("x = 1\nprint(x)");
    assert_eq!(stmts.len(), 2);
    assert!(matches!(&stmts[0], Statement::Assignment { variable, .. } if variable == "x"));
    match &stmts[1] {
        Statement::Expression {
            value: Expression::Call { arguments, .. },
            ..
        } => assert_eq!(arguments.len(), 1),
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn semicolons_separate_statements() {
    assert_eq!(parse("a = 1; b = 2; print(a + b)").len(), 3);
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let stmts = parse("#setup\n\nx = 1  # trailing\n\n");
    assert_eq!(stmts.len(), 1);
}

#[test]
fn operator_precedence() {
    let stmts = parse("2 + 3 * 4");
    match &stmts[0] {
        Statement::Expression {
            value:
                Expression::BinaryOperation {
                    operator: BinaryOperator::Addition,
                    right,
                    ..
                },
            ..
        } => assert!(matches!(
            right.as_ref(),
            Expression::BinaryOperation {
                operator: BinaryOperator::Multiplication,
                ..
            }
        )),
        other => panic!("unexpected tree: {:?}", other),
    }
}

#[test]
fn not_binds_looser_than_comparison() {
    let stmts = parse("not a == b");
    assert!(matches!(
        &stmts[0],
        Statement::Expression {
            value: Expression::UnaryOperation { .. },
            ..
        }
    ));
}

#[test]
fn index_and_map_literal() {
    let stmts = parse("m = {\n  \"a\": [1, 2],\n  'b': 3,\n}\nm['a'][0]");
    assert_eq!(stmts.len(), 2);
    match &stmts[0] {
        Statement::Assignment {
            value: Expression::MapLiteral(entries),
            ..
        } => assert_eq!(entries.len(), 2),
        other => panic!("expected map, got {:?}", other),
    }
    assert!(matches!(
        &stmts[1],
        Statement::Expression {
            value: Expression::Index { .. },
            ..
        }
    ));
}

#[test]
fn call_arguments_may_span_lines() {
    let stmts = parse("print(\n  1,\n  2,\n)");
    assert_eq!(stmts.len(), 1);
}

#[test]
fn format_string_parts() {
    let stmts = parse("f\"x = {x + 1}!\"");
    match &stmts[0] {
        Statement::Expression {
            value: Expression::FormatString(ts),
            ..
        } => {
            assert_eq!(ts.parts.len(), 3);
            assert!(matches!(&ts.parts[0], TemplateStringPart::Literal(s) if s == "x = "));
            assert!(matches!(&ts.parts[1], TemplateStringPart::Expression(_)));
            assert!(matches!(&ts.parts[2], TemplateStringPart::Literal(s) if s == "!"));
        }
        other => panic!("expected format string, got {:?}", other),
    }
}

#[test]
fn escaped_braces_in_format_string_are_literal() {
    let stmts = parse(r#"f"\{literal\}""#);
    match &stmts[0] {
        Statement::Expression {
            value: Expression::FormatString(ts),
            ..
        } => {
            assert!(matches!(&ts.parts[..], [TemplateStringPart::Literal(s)] if s == "{literal}"))
        }
        other => panic!("expected format string, got {:?}", other),
    }
}

#[test]
fn if_else_chain_across_lines() {
    let src = "if x > 1 {\n  print(1)\n}\nelse if x > 0 {\n  print(2)\n} else {\n  print(3)\n}";
    match &parse(src)[0] {
        Statement::If {
            branches,
            otherwise,
            ..
        } => {
            assert_eq!(branches.len(), 2);
            assert!(otherwise.is_some());
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn for_loop() {
    match &parse("for item in [1, 2] { print(item) }")[0] {
        Statement::For { variable, body, .. } => {
            assert_eq!(variable, "item");
            assert_eq!(body.len(), 1);
        }
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn statement_spans_cover_source() {
    let src = "x = 1\nprint(x)";
    let stmts = parse(src);
    assert_eq!(&src[stmts[1].span().clone()], "print(x)");
}

#[test]
fn unterminated_string_is_an_error() {
    assert!(parse_err("print('oops)").contains("unterminated"));
}

#[test]
fn two_expressions_on_one_line_is_an_error() {
    assert!(parse_err("print(1) print(2)").contains("end of statement"));
}

#[test]
fn unclosed_block_is_an_error() {
    assert!(parse_err("if true { print(1)").contains("'}'"));
}

#[test]
fn single_ampersand_is_rejected() {
    let err = Parser::new("a & b").parse().expect_err("expected error");
    assert_eq!(err.span, 2..3);
    assert!(!err.notes.is_empty());
}
