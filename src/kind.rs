//! Token kind taxonomy
//!
//! Kinds form a shallow hierarchy: specific kinds such as `NameVariable`
//! refine a base kind (`Name`). Downstream consumers that do not care about
//! the refinement can walk up with [`TokenKind::parent`] or test membership
//! with [`TokenKind::is_within`]. Kinds carry no numeric meaning and are
//! compared by equality only.

use serde::Serialize;
use std::fmt;

/// Classification label attached to every fragment the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Plain text and structural kinds
    Text,
    Whitespace,
    Escape,
    Error,
    Other,

    // Keywords
    Keyword,
    KeywordConstant,
    KeywordDeclaration,
    KeywordNamespace,
    KeywordPseudo,
    KeywordReserved,
    KeywordType,

    // Names
    Name,
    NameAttribute,
    NameBuiltin,
    NameClass,
    NameConstant,
    NameDecorator,
    NameEntity,
    NameException,
    NameFunction,
    NameLabel,
    NameNamespace,
    NameTag,
    NameVariable,

    // Literals
    Literal,
    LiteralDate,

    // Strings
    String,
    StringChar,
    StringDoc,
    StringDouble,
    StringEscape,
    StringInterpol,
    StringRegex,
    StringSingle,
    StringSymbol,

    // Numbers
    Number,
    NumberBin,
    NumberFloat,
    NumberHex,
    NumberInteger,
    NumberOct,

    // Operators and punctuation
    Operator,
    OperatorWord,
    Punctuation,

    // Comments
    Comment,
    CommentMultiline,
    CommentPreproc,
    CommentSingle,
    CommentSpecial,
}

impl TokenKind {
    /// The enclosing base kind, or `None` for top-level kinds.
    pub fn parent(self) -> Option<TokenKind> {
        use TokenKind::*;
        match self {
            KeywordConstant | KeywordDeclaration | KeywordNamespace | KeywordPseudo
            | KeywordReserved | KeywordType => Some(Keyword),
            NameAttribute | NameBuiltin | NameClass | NameConstant | NameDecorator
            | NameEntity | NameException | NameFunction | NameLabel | NameNamespace
            | NameTag | NameVariable => Some(Name),
            LiteralDate => Some(Literal),
            StringChar | StringDoc | StringDouble | StringEscape | StringInterpol
            | StringRegex | StringSingle | StringSymbol => Some(String),
            NumberBin | NumberFloat | NumberHex | NumberInteger | NumberOct => Some(Number),
            OperatorWord => Some(Operator),
            CommentMultiline | CommentPreproc | CommentSingle | CommentSpecial => Some(Comment),
            _ => None,
        }
    }

    /// True if `self` equals `other` or refines it (transitively).
    pub fn is_within(self, other: TokenKind) -> bool {
        let mut cur = Some(self);
        while let Some(kind) = cur {
            if kind == other {
                return true;
            }
            cur = kind.parent();
        }
        false
    }

    /// True for the `Error` kind, which marks input no rule covered.
    pub fn is_error(self) -> bool {
        self == TokenKind::Error
    }

    fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Text => "Text",
            Whitespace => "Whitespace",
            Escape => "Escape",
            Error => "Error",
            Other => "Other",
            Keyword => "Keyword",
            KeywordConstant => "Keyword.Constant",
            KeywordDeclaration => "Keyword.Declaration",
            KeywordNamespace => "Keyword.Namespace",
            KeywordPseudo => "Keyword.Pseudo",
            KeywordReserved => "Keyword.Reserved",
            KeywordType => "Keyword.Type",
            Name => "Name",
            NameAttribute => "Name.Attribute",
            NameBuiltin => "Name.Builtin",
            NameClass => "Name.Class",
            NameConstant => "Name.Constant",
            NameDecorator => "Name.Decorator",
            NameEntity => "Name.Entity",
            NameException => "Name.Exception",
            NameFunction => "Name.Function",
            NameLabel => "Name.Label",
            NameNamespace => "Name.Namespace",
            NameTag => "Name.Tag",
            NameVariable => "Name.Variable",
            Literal => "Literal",
            LiteralDate => "Literal.Date",
            String => "String",
            StringChar => "String.Char",
            StringDoc => "String.Doc",
            StringDouble => "String.Double",
            StringEscape => "String.Escape",
            StringInterpol => "String.Interpol",
            StringRegex => "String.Regex",
            StringSingle => "String.Single",
            StringSymbol => "String.Symbol",
            Number => "Number",
            NumberBin => "Number.Bin",
            NumberFloat => "Number.Float",
            NumberHex => "Number.Hex",
            NumberInteger => "Number.Integer",
            NumberOct => "Number.Oct",
            Operator => "Operator",
            OperatorWord => "Operator.Word",
            Punctuation => "Punctuation",
            Comment => "Comment",
            CommentMultiline => "Comment.Multiline",
            CommentPreproc => "Comment.Preproc",
            CommentSingle => "Comment.Single",
            CommentSpecial => "Comment.Special",
        }
    }

    /// Every kind in the taxonomy, in a stable order.
    pub fn all() -> &'static [TokenKind] {
        use TokenKind::*;
        &[
            Text,
            Whitespace,
            Escape,
            Error,
            Other,
            Keyword,
            KeywordConstant,
            KeywordDeclaration,
            KeywordNamespace,
            KeywordPseudo,
            KeywordReserved,
            KeywordType,
            Name,
            NameAttribute,
            NameBuiltin,
            NameClass,
            NameConstant,
            NameDecorator,
            NameEntity,
            NameException,
            NameFunction,
            NameLabel,
            NameNamespace,
            NameTag,
            NameVariable,
            Literal,
            LiteralDate,
            String,
            StringChar,
            StringDoc,
            StringDouble,
            StringEscape,
            StringInterpol,
            StringRegex,
            StringSingle,
            StringSymbol,
            Number,
            NumberBin,
            NumberFloat,
            NumberHex,
            NumberInteger,
            NumberOct,
            Operator,
            OperatorWord,
            Punctuation,
            Comment,
            CommentMultiline,
            CommentPreproc,
            CommentSingle,
            CommentSpecial,
        ]
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
