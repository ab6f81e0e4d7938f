//! Construction-time validation and table-level matching flags.
//! Configuration defects surface from `build()`, never mid-run.

use relex::{
    fallback, groups, include, rule, rule_to, GroupOp, Lexer, MatchFlags, TableBuilder,
    TableError, TokenKind, Transition,
};

#[test]
fn test_group_count_mismatch_rejected() {
    let err = TableBuilder::new()
        .state(
            "root",
            vec![groups(
                r"(a)(b)",
                vec![GroupOp::Emit(TokenKind::Text)],
            )],
        )
        .build()
        .unwrap_err();
    match err {
        TableError::GroupCountMismatch { groups, ops, .. } => {
            assert_eq!(groups, 2);
            assert_eq!(ops, 1);
        }
        other => panic!("expected GroupCountMismatch, got {other}"),
    }
}

#[test]
fn test_zero_pop_rejected() {
    let err = TableBuilder::new()
        .state(
            "root",
            vec![rule_to(r"x", TokenKind::Text, Transition::Pop(0))],
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, TableError::ZeroPop { .. }));
}

#[test]
fn test_duplicate_fallback_rejected() {
    let err = TableBuilder::new()
        .state(
            "root",
            vec![
                fallback(Transition::pop(1)),
                fallback(Transition::pop(2)),
            ],
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, TableError::DuplicateFallback(_)));
}

#[test]
fn test_unknown_include_target_rejected() {
    let err = TableBuilder::new()
        .state("root", vec![include("missing")])
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        TableError::UnknownState {
            state: "root".into(),
            target: "missing".into(),
        }
    );
}

#[test]
fn test_unknown_fallback_target_rejected() {
    let err = TableBuilder::new()
        .state("root", vec![fallback(Transition::push("missing"))])
        .build()
        .unwrap_err();
    assert!(matches!(err, TableError::UnknownState { .. }));
}

#[test]
fn test_error_messages_name_the_state() {
    let err = TableBuilder::new()
        .state("root", vec![rule(r"(bad", TokenKind::Text)])
        .build()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("root"), "message was: {message}");
    assert!(message.contains("(bad"), "message was: {message}");
}

#[test]
fn test_case_insensitive_flag() {
    let lexer = Lexer::new(
        TableBuilder::new()
            .flags(MatchFlags {
                case_insensitive: true,
                ..MatchFlags::default()
            })
            .state(
                "root",
                vec![
                    rule(r"select", TokenKind::Keyword),
                    rule(r"\s+", TokenKind::Whitespace),
                    rule(r"\w+", TokenKind::Name),
                ],
            )
            .build()
            .unwrap(),
    );
    let kinds: Vec<TokenKind> = lexer.tokenize("SELECT foo").map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Keyword, TokenKind::Whitespace, TokenKind::Name]
    );
}

#[test]
fn test_dot_matches_new_line_flag() {
    let build = |dotall: bool| {
        Lexer::new(
            TableBuilder::new()
                .flags(MatchFlags {
                    dot_matches_new_line: dotall,
                    ..MatchFlags::default()
                })
                .state(
                    "root",
                    vec![
                        rule(r"<!--.*?-->", TokenKind::CommentMultiline),
                        rule(r"[\s\S]", TokenKind::Text),
                    ],
                )
                .build()
                .unwrap(),
        )
    };
    let input = "<!--a\nb-->";

    let with_flag: Vec<TokenKind> = build(true).tokenize(input).map(|f| f.kind).collect();
    assert_eq!(with_flag, vec![TokenKind::CommentMultiline]);

    let without: Vec<TokenKind> = build(false).tokenize(input).map(|f| f.kind).collect();
    assert!(without.len() > 1);
    assert!(without.iter().all(|k| *k == TokenKind::Text));
}

#[test]
fn test_multi_line_flag_anchors_at_line_starts_only() {
    let lexer = Lexer::new(
        TableBuilder::new()
            .flags(MatchFlags {
                multi_line: true,
                ..MatchFlags::default()
            })
            .state(
                "root",
                vec![
                    rule(r"^#[^\n]*", TokenKind::CommentSingle),
                    rule(r"\n", TokenKind::Whitespace),
                    rule(r"[^\n#]+", TokenKind::Text),
                    rule(r"#", TokenKind::Punctuation),
                ],
            )
            .build()
            .unwrap(),
    );
    // `#x` mid-line is not a comment; `#y` at a line start is.
    let got: Vec<(usize, TokenKind)> = lexer
        .tokenize("ab#x\n#y")
        .map(|f| (f.start, f.kind))
        .collect();
    assert_eq!(
        got,
        vec![
            (0, TokenKind::Text),
            (2, TokenKind::Punctuation),
            (3, TokenKind::Text),
            (4, TokenKind::Whitespace),
            (5, TokenKind::CommentSingle),
        ]
    );
}

#[test]
fn test_unicode_flag_toggles_word_classes() {
    let build = |unicode: bool| {
        Lexer::new(
            TableBuilder::new()
                .flags(MatchFlags {
                    unicode,
                    ..MatchFlags::default()
                })
                .state("root", vec![rule(r"\w+", TokenKind::Name)])
                .build()
                .unwrap(),
        )
    };

    let with_unicode: Vec<TokenKind> = build(true).tokenize("héllo").map(|f| f.kind).collect();
    assert_eq!(with_unicode, vec![TokenKind::Name]);

    let ascii_only: Vec<TokenKind> = build(false).tokenize("héllo").map(|f| f.kind).collect();
    assert_eq!(
        ascii_only,
        vec![TokenKind::Name, TokenKind::Error, TokenKind::Name]
    );
}
