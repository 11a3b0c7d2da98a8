//! FILENAME: core/parser/src/tests.rs
//! PURPOSE: Consolidated unit tests for the parser crate.

use crate::ast::{Node, NodeKind, NodeType, Value};
use crate::error::{ErrorCategory, FormulaError};
use crate::lexer::tokenize;
use crate::parser::{parse, Parser};
use crate::token::Operator;
use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn chars(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|n| n.chars.as_str()).collect()
}

fn number_of(node: &Node) -> BigDecimal {
    node.as_value().and_then(Value::as_number).cloned().unwrap()
}

fn only(text: &str) -> Node {
    let mut nodes = tokenize(text).unwrap();
    assert_eq!(nodes.len(), 1, "expected a single node for {:?}", text);
    nodes.pop().unwrap()
}

// ========================================
// TOKENIZER TESTS: NUMBERS
// ========================================

#[test]
fn tokenizer_scans_integer() {
    let node = only("42");
    assert_eq!(node.index, 0);
    assert_eq!(node.chars, "42");
    assert_eq!(number_of(&node), dec("42"));
}

#[test]
fn tokenizer_scans_decimals() {
    assert_eq!(number_of(&only("0.5")), dec("0.5"));
    assert_eq!(number_of(&only(".5")), dec("0.5"));
    assert_eq!(number_of(&only("5.")), dec("5"));
}

#[test]
fn tokenizer_scans_scientific_notation() {
    assert_eq!(number_of(&only("1e3")), dec("1000"));
    assert_eq!(number_of(&only("1.5e-3")), dec("0.0015"));
    assert_eq!(number_of(&only("2e+2")), dec("200"));
}

#[test]
fn tokenizer_scans_signed_numbers() {
    let node = only("-0.1");
    assert_eq!(node.chars, "-0.1");
    assert_eq!(number_of(&node), dec("-0.1"));

    let node = only("+2");
    assert_eq!(node.chars, "+2");
    assert_eq!(number_of(&node), dec("2"));
}

#[test]
fn tokenizer_treats_minus_after_operator_as_sign() {
    let nodes = tokenize("2 * -3").unwrap();
    assert_eq!(chars(&nodes), vec!["2", "*", "-3"]);
    assert_eq!(number_of(&nodes[2]), dec("-3"));
    assert_eq!(nodes[2].index, 4);
}

#[test]
fn tokenizer_rejects_malformed_numbers() {
    assert_eq!(tokenize("01"), Err(FormulaError::InvalidToken));
    assert_eq!(tokenize("1e"), Err(FormulaError::InvalidToken));
    assert_eq!(tokenize("1e5e2"), Err(FormulaError::InvalidToken));
    assert_eq!(tokenize("-e5"), Err(FormulaError::InvalidToken));
    assert_eq!(
        tokenize("1.2.3"),
        Err(FormulaError::UnexpectedType("number".to_string()))
    );
}

#[test]
fn tokenizer_rejects_bare_exponent() {
    assert_eq!(tokenize("e5"), Err(FormulaError::InvalidToken));
    assert_eq!(tokenize("1 + e5"), Err(FormulaError::InvalidToken));
    assert_eq!(
        tokenize("1 e5"),
        Err(FormulaError::UnexpectedToken("e".to_string()))
    );
}

#[test]
fn tokenizer_rejects_infinite_numbers() {
    assert_eq!(tokenize("1e400"), Err(FormulaError::WillBeInfinity));
}

#[test]
fn tokenizer_reads_underflowing_numbers_as_zero() {
    let node = only("1e-999999");
    assert_eq!(node.chars, "1e-999999");
    assert_eq!(number_of(&node), dec("0"));
    assert_eq!(number_of(&only("5e-324")), dec("5e-324"));
}

#[test]
fn tokenizer_rejects_dangling_sign() {
    assert_eq!(tokenize("-"), Err(FormulaError::UnexpectedEnd));
    assert_eq!(
        tokenize("- 5"),
        Err(FormulaError::UnexpectedToken("-".to_string()))
    );
}

// ========================================
// TOKENIZER TESTS: OPERATORS
// ========================================

#[test]
fn tokenizer_scans_operators_with_spans() {
    let nodes = tokenize("1 + 2").unwrap();
    assert_eq!(chars(&nodes), vec!["1", "+", "2"]);
    assert_eq!(nodes[1].index, 2);
    assert_eq!(nodes[1].as_operator(), Some(Operator::Add));
    assert_eq!(nodes[2].index, 4);
}

#[test]
fn tokenizer_scans_comparison_operators() {
    let cases = [
        ("1 > 2", Operator::GreaterThan),
        ("1 >= 2", Operator::GreaterEqual),
        ("1 < 2", Operator::LessThan),
        ("1 <= 2", Operator::LessEqual),
        ("1 == 2", Operator::Equal),
        ("1 != 2", Operator::NotEqual),
    ];
    for (text, expected) in cases {
        let nodes = tokenize(text).unwrap();
        assert_eq!(nodes[1].as_operator(), Some(expected), "{}", text);
    }
}

#[test]
fn tokenizer_rejects_unknown_operator_runs() {
    assert_eq!(
        tokenize("1 = 2"),
        Err(FormulaError::UnexpectedToken("=".to_string()))
    );
    assert_eq!(
        tokenize("1 -- 2"),
        Err(FormulaError::UnexpectedToken("--".to_string()))
    );
}

#[test]
fn tokenizer_requires_operand_after_operator() {
    assert_eq!(tokenize("1+"), Err(FormulaError::UnexpectedEnd));
    assert_eq!(
        tokenize("* 2"),
        Err(FormulaError::UnexpectedToken("*".to_string()))
    );
}

#[test]
fn tokenizer_rejects_unknown_characters() {
    assert_eq!(
        tokenize("1 & 2"),
        Err(FormulaError::UnexpectedToken("&".to_string()))
    );
}

#[test]
fn tokenizer_rejects_empty_input() {
    assert_eq!(tokenize(""), Err(FormulaError::UnexpectedEnd));
    assert_eq!(parse("   "), Err(FormulaError::UnexpectedEnd));
}

// ========================================
// TOKENIZER TESTS: STRINGS AND VARIABLES
// ========================================

#[test]
fn tokenizer_scans_strings_with_either_quote() {
    let node = only("\"hello\"");
    assert_eq!(node.chars, "\"hello\"");
    assert_eq!(node.as_value(), Some(&Value::Text("hello".to_string())));

    let node = only("'it \"works\"'");
    assert_eq!(
        node.as_value(),
        Some(&Value::Text("it \"works\"".to_string()))
    );
}

#[test]
fn tokenizer_rejects_string_after_operator() {
    assert_eq!(tokenize("1 + \"a\""), Err(FormulaError::StringFollowOperator));
}

#[test]
fn tokenizer_rejects_adjacent_strings() {
    assert_eq!(
        tokenize("\"a\" \"b\""),
        Err(FormulaError::UnexpectedType("string".to_string()))
    );
    assert_eq!(
        tokenize("\"a\" 1"),
        Err(FormulaError::UnexpectedType("number".to_string()))
    );
}

#[test]
fn tokenizer_rejects_unterminated_string() {
    assert_eq!(tokenize("\"abc"), Err(FormulaError::UnexpectedEnd));
}

#[test]
fn tokenizer_scans_variables() {
    let nodes = tokenize("{price} * 2").unwrap();
    assert_eq!(nodes[0].kind, NodeKind::Variable("price".to_string()));
    assert_eq!(nodes[0].chars, "{price}");
    assert_eq!(nodes[1].index, 8);
}

#[test]
fn tokenizer_rejects_bad_variables() {
    assert_eq!(tokenize("{}"), Err(FormulaError::VariableNameEmpty));
    assert_eq!(tokenize("{a"), Err(FormulaError::UnexpectedEnd));
    assert_eq!(
        tokenize("1 {a}"),
        Err(FormulaError::UnexpectedToken("{".to_string()))
    );
}

// ========================================
// TOKENIZER TESTS: GROUPS
// ========================================

#[test]
fn tokenizer_nests_groups() {
    let nodes = tokenize("1 + (2 * 3)").unwrap();
    assert_eq!(nodes.len(), 3);

    let group = &nodes[2];
    assert_eq!(group.index, 4);
    assert_eq!(group.chars, "(2 * 3)");
    match &group.kind {
        NodeKind::Group(body) => {
            assert_eq!(chars(body), vec!["2", "*", "3"]);
            assert_eq!(body[0].index, 5);
        }
        other => panic!("expected group, got {:?}", other),
    }
}

#[test]
fn tokenizer_rejects_group_errors() {
    assert_eq!(tokenize("()"), Err(FormulaError::GroupEmpty));
    assert_eq!(tokenize("(1"), Err(FormulaError::UnexpectedGroupEnd));
    assert_eq!(tokenize("((1)"), Err(FormulaError::UnexpectedGroupEnd));
    assert_eq!(
        tokenize("1)"),
        Err(FormulaError::UnexpectedToken(")".to_string()))
    );
    assert_eq!(
        tokenize("(1+)"),
        Err(FormulaError::UnexpectedToken(")".to_string()))
    );
}

#[test]
fn tokenizer_rejects_call_on_non_function() {
    assert_eq!(
        tokenize("1(2)"),
        Err(FormulaError::NotAFunction("1".to_string()))
    );
}

// ========================================
// TOKENIZER TESTS: METHODS
// ========================================

#[test]
fn tokenizer_scans_method_call() {
    let node = only("$add(1, 2)");
    assert_eq!(node.chars, "$add(1, 2)");
    match &node.kind {
        NodeKind::Method { name, params } => {
            assert_eq!(name, "add");
            assert_eq!(chars(params), vec!["1", "2"]);
            assert_eq!(params[1].index, 8);
        }
        other => panic!("expected method, got {:?}", other),
    }
}

#[test]
fn tokenizer_wraps_multi_node_arguments_in_groups() {
    let node = only("$add(1 + 2, 3)");
    let NodeKind::Method { params, .. } = &node.kind else {
        panic!("expected method");
    };
    assert_eq!(params.len(), 2);
    assert!(params[0].is_group());
    assert_eq!(params[0].index, 5);
    assert_eq!(params[0].chars, "1 + 2");
}

#[test]
fn tokenizer_scans_nested_methods_and_strings() {
    let node = only("$concat(\"a\", $text(1))");
    let NodeKind::Method { params, .. } = &node.kind else {
        panic!("expected method");
    };
    assert_eq!(params[0].as_value(), Some(&Value::Text("a".to_string())));
    assert!(params[1].is_method());
    assert_eq!(params[1].chars, "$text(1)");
}

#[test]
fn tokenizer_accepts_empty_argument_list() {
    let node = only("$now()");
    assert_eq!(
        node.kind,
        NodeKind::Method {
            name: "now".to_string(),
            params: Vec::new()
        }
    );
}

#[test]
fn tokenizer_rejects_stray_commas() {
    let comma = Err(FormulaError::UnexpectedToken(",".to_string()));
    assert_eq!(tokenize("$add(1,)"), comma);
    assert_eq!(tokenize("$add(,1)"), comma);
    assert_eq!(tokenize("$add(1+,2)"), comma);
    assert_eq!(tokenize("1, 2"), comma);
}

#[test]
fn tokenizer_rejects_bad_method_calls() {
    assert_eq!(tokenize("$add"), Err(FormulaError::NotCalled("add".to_string())));
    assert_eq!(
        tokenize("$add(1"),
        Err(FormulaError::NotCalled("add".to_string()))
    );
    assert_eq!(tokenize("$(1)"), Err(FormulaError::FunctionNameEmpty));
    assert_eq!(
        tokenize("$"),
        Err(FormulaError::UnexpectedToken("$".to_string()))
    );
}

#[test]
fn tokenizer_uses_byte_offsets_for_unicode() {
    let node = only("$concat(\"é\", \"x\")");
    let NodeKind::Method { params, .. } = &node.kind else {
        panic!("expected method");
    };
    assert_eq!(params[0].index, 8);
    assert_eq!(params[1].index, 14);
    assert_eq!(params[1].chars, "\"x\"");
}

// ========================================
// PREFIX REWRITE TESTS
// ========================================

#[test]
fn rewrite_orders_by_weight() {
    let nodes = parse("1 + 2 * 3").unwrap();
    assert_eq!(chars(&nodes), vec!["3", "2", "*", "1", "+"]);
}

#[test]
fn rewrite_keeps_equal_weights_left_associative() {
    let nodes = parse("8 - 3 - 2").unwrap();
    assert_eq!(chars(&nodes), vec!["2", "3", "8", "-", "-"]);
}

#[test]
fn rewrite_places_comparison_last() {
    let nodes = parse("1 + 1 > 1").unwrap();
    assert_eq!(chars(&nodes), vec!["1", "1", "1", "+", ">"]);
}

#[test]
fn rewrite_recurses_into_groups_and_arguments() {
    let nodes = parse("(1 + 2) * $add(3 - 4, 5)").unwrap();
    assert_eq!(chars(&nodes), vec!["$add(3 - 4, 5)", "(1 + 2)", "*"]);

    let NodeKind::Group(body) = &nodes[1].kind else {
        panic!("expected group");
    };
    assert_eq!(chars(body), vec!["2", "1", "+"]);

    let NodeKind::Method { params, .. } = &nodes[0].kind else {
        panic!("expected method");
    };
    let NodeKind::Group(arg) = &params[0].kind else {
        panic!("expected group argument");
    };
    assert_eq!(chars(arg), vec!["4", "3", "-"]);
}

#[test]
fn parse_trims_input() {
    let nodes = parse("  1 + 2  ").unwrap();
    assert_eq!(chars(&nodes), vec!["2", "1", "+"]);
    assert_eq!(nodes[0].index, 4);
    assert_eq!(nodes[1].index, 0);
}

#[test]
fn parse_is_deterministic() {
    assert_eq!(parse("(1+(2-3)*4)/5"), parse("(1+(2-3)*4)/5"));
}

// ========================================
// CACHED PARSER TESTS
// ========================================

#[test]
fn parser_returns_cached_tree() {
    let parser = Parser::new(4);
    let first = parser.parse("1 + 2").unwrap();
    let second = parser.parse("1 + 2").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(parser.len(), 1);
}

#[test]
fn parser_shares_entry_for_surrounding_whitespace() {
    let parser = Parser::new(4);
    let bare = parser.parse("1+2").unwrap();
    let padded = parser.parse("  1+2\t").unwrap();
    assert!(Arc::ptr_eq(&bare, &padded));
    assert_eq!(parser.len(), 1);
}

#[test]
fn parser_evicts_least_recently_used() {
    let parser = Parser::new(2);
    let one = parser.parse("1 + 1").unwrap();
    parser.parse("2 + 2").unwrap();
    parser.parse("1 + 1").unwrap();
    parser.parse("3 + 3").unwrap();

    assert_eq!(parser.len(), 2);
    assert!(Arc::ptr_eq(&one, &parser.parse("1 + 1").unwrap()));
}

#[test]
fn parser_with_zero_capacity_does_not_cache() {
    let parser = Parser::new(0);
    parser.parse("1 + 2").unwrap();
    assert!(parser.is_empty());
}

#[test]
fn parser_does_not_cache_failures() {
    let parser = Parser::new(4);
    assert_eq!(parser.parse("1 +").unwrap_err(), FormulaError::UnexpectedEnd);
    assert!(parser.is_empty());
}

#[test]
fn parser_clear_empties_cache() {
    let parser = Parser::default();
    parser.parse("1").unwrap();
    parser.clear();
    assert!(parser.is_empty());
    assert_eq!(parser.capacity(), 256);
}

// ========================================
// TYPE MODEL AND ERROR TESTS
// ========================================

#[test]
fn node_type_renders_unions() {
    assert_eq!((NodeType::TEXT | NodeType::NUMBER).to_string(), "string or number");
    assert_eq!(NodeType::DATETIME.to_string(), "date");
    assert_eq!(NodeType::empty().to_string(), "unknown");
}

#[test]
fn node_type_accepts_by_intersection() {
    assert!(NodeType::VALUE.accepts(NodeType::BOOLEAN));
    assert!(!NodeType::NUMBER.accepts(NodeType::TEXT));
}

#[test]
fn error_messages_name_the_culprit() {
    assert_eq!(
        FormulaError::NotCalled("add".to_string()).to_string(),
        "Method $add not called."
    );
    assert_eq!(
        FormulaError::NotAssignableParameter {
            actual: NodeType::TEXT,
            expected: NodeType::NUMBER,
        }
        .to_string(),
        "Argument of type 'string' is not assignable to parameter of type 'number'."
    );
}

#[test]
fn error_categories() {
    assert_eq!(FormulaError::GroupEmpty.category(), ErrorCategory::Syntax);
    assert_eq!(
        FormulaError::VariableNotDefined("x".to_string()).category(),
        ErrorCategory::Reference
    );
    assert_eq!(FormulaError::DivisionByZero.category(), ErrorCategory::Numeric);
    assert_eq!(
        FormulaError::MostNArgumentsIsRequired(2).category(),
        ErrorCategory::Arity
    );
}

#[test]
fn values_round_trip_through_json() {
    let values = vec![
        Value::Text("a".to_string()),
        Value::Number(dec("1.25")),
        Value::Boolean(true),
    ];
    let json = serde_json::to_string(&values).unwrap();
    let back: Vec<Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, values);
}
