//! Callback rules and the auxiliary mode stack
//!
//! Models the embedded-element grammar shape: expression context and
//! element bodies nest through each other arbitrarily, and closing a
//! construct must return to whichever mode was active before entry. The
//! state stack alone cannot record that, so callbacks thread it through
//! the mode stack.

use relex::{callback, rule, CallbackScope, Lexer, StateTable, TableBuilder, TokenKind};

fn enter_element(scope: &mut CallbackScope) {
    scope.emit_match(TokenKind::NameTag);
    let before = scope.state().to_string();
    scope.push_mode(&before);
    scope.replace_stack(&["element"]);
}

fn leave_to_remembered_mode(scope: &mut CallbackScope, kind: TokenKind) {
    scope.emit_match(kind);
    let back = scope.pop_mode().unwrap_or_else(|| "root".to_string());
    scope.replace_stack(&[back.as_str()]);
}

/// Expression context (`root`) with embedded elements; element bodies with
/// embedded `{ expression }` blocks.
fn markup_table() -> StateTable {
    TableBuilder::new()
        .state(
            "root",
            vec![
                rule(r"\s+", TokenKind::Whitespace),
                rule(r"\d+", TokenKind::NumberInteger),
                rule(r"\+", TokenKind::Operator),
                callback(r"<[a-z]+>", enter_element),
                callback(r"\}", |scope| {
                    leave_to_remembered_mode(scope, TokenKind::Punctuation)
                }),
            ],
        )
        .state(
            "element",
            vec![
                callback(r"</[a-z]+>", |scope| {
                    leave_to_remembered_mode(scope, TokenKind::NameTag)
                }),
                callback(r"<[a-z]+>", enter_element),
                callback(r"\{", |scope| {
                    scope.emit_match(TokenKind::Punctuation);
                    scope.push_mode("element");
                    scope.replace_stack(&["root"]);
                }),
                rule(r"[^<{}]+", TokenKind::Text),
            ],
        )
        .build()
        .unwrap()
}

fn collect(lexer: &Lexer, input: &str) -> Vec<(usize, TokenKind, String)> {
    lexer
        .tokenize(input)
        .map(|f| (f.start, f.kind, f.text.to_string()))
        .collect()
}

#[test]
fn test_mode_stack_returns_to_pre_entry_mode() {
    let lexer = Lexer::new(markup_table());
    let got = collect(&lexer, "1 + <a>x{2}y</a> + 3");
    assert_eq!(
        got,
        vec![
            (0, TokenKind::NumberInteger, "1".to_string()),
            (1, TokenKind::Whitespace, " ".to_string()),
            (2, TokenKind::Operator, "+".to_string()),
            (3, TokenKind::Whitespace, " ".to_string()),
            (4, TokenKind::NameTag, "<a>".to_string()),
            (7, TokenKind::Text, "x".to_string()),
            (8, TokenKind::Punctuation, "{".to_string()),
            (9, TokenKind::NumberInteger, "2".to_string()),
            (10, TokenKind::Punctuation, "}".to_string()),
            (11, TokenKind::Text, "y".to_string()),
            (12, TokenKind::NameTag, "</a>".to_string()),
            (16, TokenKind::Whitespace, " ".to_string()),
            (17, TokenKind::Operator, "+".to_string()),
            (18, TokenKind::Whitespace, " ".to_string()),
            (19, TokenKind::NumberInteger, "3".to_string()),
        ]
    );
}

#[test]
fn test_elements_nest_through_expressions() {
    let lexer = Lexer::new(markup_table());
    let input = "<a>x{1 + <b>y{2}z</b>}w</a>";
    let got = collect(&lexer, input);
    let rebuilt: String = got.iter().map(|(_, _, t)| t.as_str()).collect();
    assert_eq!(rebuilt, input);
    // `w` sits back in the outer element body; `z` in the inner one.
    assert!(got.contains(&(16, TokenKind::Text, "z".to_string())));
    assert!(got.contains(&(22, TokenKind::Text, "w".to_string())));
    // Nothing after the outer close is left in element mode: the stream
    // is exactly the input's length, balanced and fully classified.
    assert_eq!(got.last().unwrap().1, TokenKind::NameTag);
}

#[test]
fn test_runs_do_not_share_mode_state() {
    let lexer = Lexer::new(markup_table());

    // First run ends mid-element with a pending `{`: its mode stack dies
    // with the run.
    let _ = collect(&lexer, "<a>{");

    // If the mode stack leaked, this `}` would restore element mode and
    // tokenize `abc` as Text. Fresh runs fall back to root, where letters
    // are uncovered and degrade to per-char errors.
    let got = collect(&lexer, "}abc");
    assert_eq!(got[0], (0, TokenKind::Punctuation, "}".to_string()));
    assert!(got[1..]
        .iter()
        .all(|(_, kind, _)| *kind == TokenKind::Error));
}

#[test]
fn test_callback_may_consume_past_the_match() {
    // The callback matches only `@`, then claims the following word too.
    let lexer = Lexer::new(
        TableBuilder::new()
            .state(
                "root",
                vec![
                    callback(r"@", |scope| {
                        let end = scope.start() + 4;
                        scope.emit(TokenKind::CommentSpecial, scope.start()..end);
                        scope.set_pos(end);
                    }),
                    rule(r"[a-z]+", TokenKind::Text),
                    rule(r"\s+", TokenKind::Whitespace),
                ],
            )
            .build()
            .unwrap(),
    );
    assert_eq!(
        collect(&lexer, "@abc rest"),
        vec![
            (0, TokenKind::CommentSpecial, "@abc".to_string()),
            (4, TokenKind::Whitespace, " ".to_string()),
            (5, TokenKind::Text, "rest".to_string()),
        ]
    );
}

#[test]
fn test_callback_may_leave_part_of_the_match() {
    // Matches `word:` but only consumes the word, leaving `:` for the
    // ordinary punctuation rule.
    let lexer = Lexer::new(
        TableBuilder::new()
            .state(
                "root",
                vec![
                    callback(r"([a-z]+)(:)", |scope| {
                        scope.emit_group(TokenKind::NameLabel, 1);
                        if let Some(span) = scope.group_span(1) {
                            scope.set_pos(span.end);
                        }
                    }),
                    rule(r":", TokenKind::Punctuation),
                    rule(r"[a-z]+", TokenKind::Text),
                ],
            )
            .build()
            .unwrap(),
    );
    assert_eq!(
        collect(&lexer, "abc:x"),
        vec![
            (0, TokenKind::NameLabel, "abc".to_string()),
            (3, TokenKind::Punctuation, ":".to_string()),
            (4, TokenKind::Text, "x".to_string()),
        ]
    );
}

#[test]
fn test_callback_without_set_pos_advances_to_match_end() {
    let lexer = Lexer::new(
        TableBuilder::new()
            .state(
                "root",
                vec![
                    callback(r"--", |scope| {
                        scope.emit_match(TokenKind::CommentSingle);
                    }),
                    rule(r"[a-z]+", TokenKind::Text),
                ],
            )
            .build()
            .unwrap(),
    );
    assert_eq!(
        collect(&lexer, "--ok"),
        vec![
            (0, TokenKind::CommentSingle, "--".to_string()),
            (2, TokenKind::Text, "ok".to_string()),
        ]
    );
}
