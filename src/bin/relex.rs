//! Command-line interface for relex
//!
//! Tokenizes a file with the built-in demo table and prints the fragment
//! stream, either as readable lines or as JSON (one fragment per line).
//! The demo table is an INI-style configuration language; real language
//! tables are expected to live with their consumers, not here.
//!
//! Usage:
//!   relex tokenize `<path>` [--json]  - Print the fragment stream for a file
//!   relex kinds                       - List the token kind taxonomy

use clap::{Arg, ArgAction, Command};
use relex::{groups, rule, rule_to, Lexer, StateTable, TableBuilder, TokenKind, Transition};

fn main() {
    let matches = Command::new("relex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A regex-driven, state-stack tokenizer engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("tokenize")
                .about("Tokenize a file with the built-in demo table")
                .arg(
                    Arg::new("path")
                        .help("Path to the file to tokenize")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit one JSON fragment per line")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("kinds").about("List the token kind taxonomy"))
        .get_matches();

    match matches.subcommand() {
        Some(("tokenize", sub)) => {
            let path = sub.get_one::<String>("path").unwrap();
            let json = sub.get_flag("json");
            handle_tokenize_command(path, json);
        }
        Some(("kinds", _)) => {
            for kind in TokenKind::all() {
                println!("{kind}");
            }
        }
        _ => unreachable!(),
    }
}

fn handle_tokenize_command(path: &str, json: bool) {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file: {}", e);
        std::process::exit(1);
    });

    let table = demo_table().unwrap_or_else(|e| {
        eprintln!("Error building demo table: {}", e);
        std::process::exit(1);
    });
    let lexer = Lexer::new(table);

    for frag in lexer.tokenize(&source) {
        if json {
            match serde_json::to_string(&frag) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("Error serializing fragment: {}", e);
                    std::process::exit(1);
                }
            }
        } else {
            println!("{:>6}  {:<18}  {:?}", frag.start, frag.kind.to_string(), frag.text);
        }
    }
}

/// Demo table: INI-style configuration files.
fn demo_table() -> Result<StateTable, relex::TableError> {
    TableBuilder::new()
        .state(
            "root",
            vec![
                rule(r"[;#][^\n]*", TokenKind::CommentSingle),
                groups(
                    r"(\[)([^\]\n]+)(\])",
                    vec![
                        relex::GroupOp::Emit(TokenKind::Punctuation),
                        relex::GroupOp::Emit(TokenKind::NameNamespace),
                        relex::GroupOp::Emit(TokenKind::Punctuation),
                    ],
                ),
                groups(
                    r"([A-Za-z_][\w.-]*)([ \t]*)(=)",
                    vec![
                        relex::GroupOp::Emit(TokenKind::NameAttribute),
                        relex::GroupOp::Emit(TokenKind::Whitespace),
                        relex::GroupOp::Emit(TokenKind::Operator),
                    ],
                ),
                rule_to(r#"""#, TokenKind::StringDouble, Transition::push("dq")),
                rule(r"\d+\.\d+", TokenKind::NumberFloat),
                rule(r"\d+", TokenKind::NumberInteger),
                rule(
                    r"\b(?:true|false|yes|no|on|off)\b",
                    TokenKind::KeywordConstant,
                ),
                rule(r"\s+", TokenKind::Whitespace),
                rule(r#"[^\s"=\[\];#]+"#, TokenKind::Text),
            ],
        )
        .state(
            "dq",
            vec![
                rule(r"\\.", TokenKind::StringEscape),
                rule_to(r#"""#, TokenKind::StringDouble, Transition::pop(1)),
                rule(r#"[^"\\]+"#, TokenKind::StringDouble),
            ],
        )
        .build()
}
