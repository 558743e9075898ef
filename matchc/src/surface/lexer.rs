use codespan_reporting::diagnostic::{Diagnostic, Label};
use logos::Logos;

use crate::files::FileId;
use crate::source::{BytePos, ByteRange};

#[derive(Clone, Debug, PartialEq, Eq, Logos)]
#[logos(extras = FileId)]
pub enum Token<'source> {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    #[regex(r"r#[a-zA-Z_][a-zA-Z0-9_]*", |lex| &lex.slice()[2..])]
    Name(&'source str),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| &lex.slice()[1..(lex.slice().len() - 1)])]
    StringLiteral(&'source str),
    #[regex(r"[+-]?[0-9][a-zA-Z0-9_]*")]
    NumberLiteral(&'source str),

    #[token("by")]
    KeywordBy,
    #[token("def")]
    KeywordDef,
    #[token("false")]
    KeywordFalse,
    #[token("if")]
    KeywordIf,
    #[token("match")]
    KeywordMatch,
    #[token("true")]
    KeywordTrue,
    #[token("type")]
    KeywordType,

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token("=>")]
    EqualsGreater,
    #[token(".")]
    FullStop,
    #[token("|")]
    Pipe,
    #[token(";")]
    Semicolon,
    #[token("_")]
    Underscore,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[error]
    #[regex(r"\p{Whitespace}", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Error,
}

pub type Spanned<Tok, Loc> = (Loc, Tok, Loc);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedCharacter { range: ByteRange },
}

impl Error {
    pub fn range(&self) -> ByteRange {
        match self {
            Error::UnexpectedCharacter { range } => *range,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Error::UnexpectedCharacter { range } => Diagnostic::error()
                .with_message("unexpected character")
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
        }
    }
}

pub fn tokens(
    file_id: FileId,
    source: &str,
) -> impl Iterator<Item = Result<Spanned<Token<'_>, BytePos>, Error>> {
    assert!(
        source.len() <= u32::MAX as usize,
        "`source` must be less than 4GiB in length"
    );

    Token::lexer_with_extras(source, file_id)
        .spanned()
        .map(move |(token, range)| {
            let start = range.start as BytePos;
            let end = range.end as BytePos;
            match token {
                Token::Error => Err(Error::UnexpectedCharacter {
                    range: ByteRange::new(file_id, start, end),
                }),
                token => Ok((start, token, end)),
            }
        })
}

/// Resolve the escape sequences in the contents of a string literal.
pub fn unescape(contents: &str) -> String {
    let mut output = String::with_capacity(contents.len());
    let mut chars = contents.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => output.push('\n'),
                Some('t') => output.push('\t'),
                Some(c) => output.push(c),
                None => output.push('\\'),
            },
            c => output.push(c),
        }
    }
    output
}

impl<'source> Token<'source> {
    pub fn description(&self) -> &'static str {
        match self {
            Token::Name(_) => "name",
            Token::StringLiteral(_) => "string literal",
            Token::NumberLiteral(_) => "number literal",
            Token::KeywordBy => "by",
            Token::KeywordDef => "def",
            Token::KeywordFalse => "false",
            Token::KeywordIf => "if",
            Token::KeywordMatch => "match",
            Token::KeywordTrue => "true",
            Token::KeywordType => "type",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Equals => "=",
            Token::EqualsGreater => "=>",
            Token::FullStop => ".",
            Token::Pipe => "|",
            Token::Semicolon => ";",
            Token::Underscore => "_",
            Token::OpenBrace => "{",
            Token::CloseBrace => "}",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Error => "error",
        }
    }

    /// The text of a name or keyword. Labels may be spelled like keywords.
    pub fn label_text(&self) -> Option<&'source str> {
        match self {
            Token::Name(name) => Some(*name),
            Token::KeywordBy => Some("by"),
            Token::KeywordDef => Some("def"),
            Token::KeywordFalse => Some("false"),
            Token::KeywordIf => Some("if"),
            Token::KeywordMatch => Some("match"),
            Token::KeywordTrue => Some("true"),
            Token::KeywordType => Some("type"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token<'_>> {
        let file_id = FileId::try_from(1).unwrap();
        tokens(file_id, source)
            .map(|result| result.map(|(_, token, _)| token).unwrap())
            .collect()
    }

    #[test]
    fn keywords_and_names() {
        assert_eq!(
            lex("match shape by kind { _tag => f, _ => g }"),
            vec![
                Token::KeywordMatch,
                Token::Name("shape"),
                Token::KeywordBy,
                Token::Name("kind"),
                Token::OpenBrace,
                Token::Name("_tag"),
                Token::EqualsGreater,
                Token::Name("f"),
                Token::Comma,
                Token::Underscore,
                Token::EqualsGreater,
                Token::Name("g"),
                Token::CloseBrace,
            ],
        );
    }

    #[test]
    fn literals_and_comments() {
        assert_eq!(
            lex("// a comment\n\"not \\\"found\\\"\" -404 r#type"),
            vec![
                Token::StringLiteral("not \\\"found\\\""),
                Token::NumberLiteral("-404"),
                Token::Name("type"),
            ],
        );
    }

    #[test]
    fn trailing_comment_without_newline() {
        assert_eq!(lex("def //~ exit-code = 0"), vec![Token::KeywordDef]);
    }

    #[test]
    fn unexpected_characters() {
        let file_id = FileId::try_from(1).unwrap();
        let errors = tokens(file_id, "a # b")
            .filter_map(Result::err)
            .collect::<Vec<_>>();
        assert_eq!(
            errors,
            vec![Error::UnexpectedCharacter { range: ByteRange::new(file_id, 2, 3) }],
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(unescape(r#"not \"found\"\n"#), "not \"found\"\n");
        assert_eq!(unescape(r"a\\b"), r"a\b");
    }
}
