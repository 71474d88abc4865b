//! Statement classification

use bgov_domain::StatementKind;

#[test]
fn loop_and_jump_keywords() {
    for keyword in ["FOR", "next", " Goto ", "GOSUB"] {
        assert!(
            StatementKind::from_keyword(keyword).is_loop_or_jump(),
            "{keyword}"
        );
    }
}

#[test]
fn everything_else_is_other() {
    for keyword in ["PRINT", "LET", "IF", "RETURN", ""] {
        assert_eq!(StatementKind::from_keyword(keyword), StatementKind::Other);
    }
    assert!(!StatementKind::Other.is_loop_or_jump());
}
