//! A recursive descent parser over the token stream.
//!
//! Syntax errors abandon the current item: tokens are skipped up to the
//! next `;`, and parsing resumes with the item after it.

use scoped_arena::Scope;

use crate::alloc;
use crate::files::FileId;
use crate::source::{BytePos, ByteRange};
use crate::surface::lexer::{self, Spanned, Token};
use crate::surface::{
    Def, Guard, Item, Key, KeyedArm, Literal, MatchArms, MatchExpr, Module, ParseMessage, Term,
    Type, TypeDef,
};
use crate::symbol::Symbol;

type ParseResult<T> = Result<T, ParseMessage>;

pub struct Parser<'arena, 'source> {
    scope: &'arena Scope<'arena>,
    file_id: FileId,
    tokens: Vec<Spanned<Token<'source>, BytePos>>,
    pos: usize,
    /// The end of the most recently consumed token.
    last_end: BytePos,
    eof: BytePos,
    messages: Vec<ParseMessage>,
}

impl<'arena, 'source> Parser<'arena, 'source> {
    pub fn new(
        scope: &'arena Scope<'arena>,
        file_id: FileId,
        source: &'source str,
    ) -> Parser<'arena, 'source> {
        let mut messages = Vec::new();
        let tokens = lexer::tokens(file_id, source)
            .filter_map(|result| match result {
                Ok(token) => Some(token),
                Err(error) => {
                    messages.push(ParseMessage::Lexer(error));
                    None
                }
            })
            .collect();

        Parser {
            scope,
            file_id,
            tokens,
            pos: 0,
            last_end: 0,
            eof: source.len() as BytePos,
            messages,
        }
    }

    pub fn parse_module(mut self) -> (Module<'arena>, Vec<ParseMessage>) {
        let mut items = Vec::new();
        while self.peek().is_some() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(message) => {
                    self.messages.push(message);
                    self.recover();
                }
            }
        }

        let module = Module {
            items: alloc::slice_from_iter(self.scope, items),
        };
        (module, self.messages)
    }

    // Token stream

    fn peek(&self) -> Option<&Token<'source>> {
        self.tokens.get(self.pos).map(|(_, token, _)| token)
    }

    fn peek_start(&self) -> BytePos {
        self.tokens.get(self.pos).map_or(self.eof, |(start, _, _)| *start)
    }

    fn bump(&mut self) -> Option<Spanned<Token<'source>, BytePos>> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        self.last_end = token.2;
        Some(token)
    }

    fn check(&self, token: &Token<'source>) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token<'source>) -> bool {
        let is_match = self.check(token);
        if is_match {
            self.bump();
        }
        is_match
    }

    fn expect(&mut self, token: Token<'source>) -> ParseResult<ByteRange> {
        if self.check(&token) {
            let start = self.peek_start();
            self.bump();
            Ok(self.range_from(start))
        } else {
            Err(self.unexpected(&[quoted(&token)]))
        }
    }

    fn range_from(&self, start: BytePos) -> ByteRange {
        ByteRange::new(self.file_id, start, self.last_end.max(start))
    }

    fn unexpected(&self, expected: &[impl ToString]) -> ParseMessage {
        let expected = expected.iter().map(ToString::to_string).collect();
        match self.tokens.get(self.pos) {
            Some((start, token, end)) => ParseMessage::UnexpectedToken {
                range: ByteRange::new(self.file_id, *start, *end),
                token: quoted(token),
                expected,
            },
            None => ParseMessage::UnexpectedEof {
                range: ByteRange::new(self.file_id, self.eof, self.eof),
                expected,
            },
        }
    }

    /// Skip past the next `;`.
    fn recover(&mut self) {
        while let Some((_, token, _)) = self.bump() {
            if token == Token::Semicolon {
                break;
            }
        }
    }

    // Items

    fn parse_item(&mut self) -> ParseResult<Item<'arena>> {
        let start = self.peek_start();
        match self.peek() {
            Some(Token::KeywordType) => {
                self.bump();
                let name = self.expect_name()?;
                self.expect(Token::Equals)?;
                let r#type = self.parse_type()?;
                self.expect(Token::Semicolon)?;
                Ok(Item::Type(TypeDef {
                    range: self.range_from(start),
                    name,
                    r#type,
                }))
            }
            Some(Token::KeywordDef) => {
                self.bump();
                let name = self.expect_name()?;
                self.expect(Token::Equals)?;
                let expr = self.parse_match_expr()?;
                self.expect(Token::Semicolon)?;
                Ok(Item::Def(Def {
                    range: self.range_from(start),
                    name,
                    expr,
                }))
            }
            _ => Err(self.unexpected(&["`def`", "`type`"])),
        }
    }

    fn expect_name(&mut self) -> ParseResult<(ByteRange, Symbol)> {
        match self.peek() {
            Some(Token::Name(name)) => {
                let name = Symbol::intern(name);
                let start = self.peek_start();
                self.bump();
                Ok((self.range_from(start), name))
            }
            _ => Err(self.unexpected(&["name"])),
        }
    }

    fn expect_label(&mut self) -> ParseResult<(ByteRange, Symbol)> {
        match self.peek().and_then(Token::label_text) {
            Some(label) => {
                let label = Symbol::intern(label);
                let start = self.peek_start();
                self.bump();
                Ok((self.range_from(start), label))
            }
            None => Err(self.unexpected(&["label"])),
        }
    }

    fn parse_literal(&mut self) -> Option<Literal> {
        let literal = match self.peek()? {
            Token::StringLiteral(contents) => Literal::String(Symbol::intern(lexer::unescape(contents))),
            Token::NumberLiteral(text) => Literal::Number(Symbol::intern(text)),
            Token::KeywordTrue => Literal::Bool(true),
            Token::KeywordFalse => Literal::Bool(false),
            _ => return None,
        };
        self.bump();
        Some(literal)
    }

    // Types

    fn parse_type(&mut self) -> ParseResult<Type<'arena>> {
        let start = self.peek_start();
        let leading_pipe = self.eat(&Token::Pipe);
        let first = self.parse_atomic_type()?;
        if !leading_pipe && !self.check(&Token::Pipe) {
            return Ok(first);
        }

        let mut types = vec![first];
        while self.eat(&Token::Pipe) {
            types.push(self.parse_atomic_type()?);
        }
        Ok(Type::Union(
            self.range_from(start),
            alloc::slice_from_iter(self.scope, types),
        ))
    }

    fn parse_atomic_type(&mut self) -> ParseResult<Type<'arena>> {
        let start = self.peek_start();
        if let Some(literal) = self.parse_literal() {
            return Ok(Type::Literal(self.range_from(start), literal));
        }

        match self.peek() {
            Some(Token::Name(_)) => {
                let (range, name) = self.expect_name()?;
                Ok(Type::Name(range, name))
            }
            Some(Token::OpenBrace) => {
                self.bump();
                let mut fields = Vec::new();
                while !self.check(&Token::CloseBrace) {
                    let label = self.expect_label()?;
                    self.expect(Token::Colon)?;
                    fields.push((label, self.parse_type()?));
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::CloseBrace)?;
                Ok(Type::Record(
                    self.range_from(start),
                    alloc::slice_from_iter(self.scope, fields),
                ))
            }
            Some(Token::OpenParen) => {
                self.bump();
                let r#type = self.parse_type()?;
                self.expect(Token::CloseParen)?;
                Ok(r#type)
            }
            _ => Err(self.unexpected(&["type", "literal", "`{`", "`(`"])),
        }
    }

    // Terms

    fn parse_term(&mut self) -> ParseResult<Term<'arena>> {
        let start = self.peek_start();
        let mut term = self.parse_atomic_term()?;
        loop {
            if self.eat(&Token::FullStop) {
                let label = self.expect_label()?;
                term = Term::Proj(self.range_from(start), self.scope.to_scope(term), label);
            } else if self.eat(&Token::OpenParen) {
                let arg = self.parse_term()?;
                self.expect(Token::CloseParen)?;
                term = Term::App(
                    self.range_from(start),
                    self.scope.to_scope(term),
                    self.scope.to_scope(arg),
                );
            } else {
                return Ok(term);
            }
        }
    }

    fn parse_atomic_term(&mut self) -> ParseResult<Term<'arena>> {
        let start = self.peek_start();
        if let Some(literal) = self.parse_literal() {
            return Ok(Term::Literal(self.range_from(start), literal));
        }

        match self.peek() {
            Some(Token::Name(_)) => {
                let (range, name) = self.expect_name()?;
                Ok(Term::Name(range, name))
            }
            Some(Token::OpenParen) => {
                self.bump();
                let term = self.parse_term()?;
                if self.eat(&Token::Colon) {
                    let r#type = self.parse_type()?;
                    self.expect(Token::CloseParen)?;
                    Ok(Term::Ann(
                        self.range_from(start),
                        self.scope.to_scope(term),
                        self.scope.to_scope(r#type),
                    ))
                } else {
                    self.expect(Token::CloseParen)?;
                    Ok(term)
                }
            }
            _ => Err(self.unexpected(&["term"])),
        }
    }

    // Match expressions

    fn parse_match_expr(&mut self) -> ParseResult<MatchExpr<'arena>> {
        let start = self.peek_start();
        self.expect(Token::KeywordMatch)?;
        let scrutinee = self.parse_term()?;
        let discriminant = if self.eat(&Token::KeywordBy) {
            Some(self.expect_label()?)
        } else {
            None
        };

        let arms = match self.peek() {
            Some(Token::OpenBrace) => MatchArms::Keyed(self.parse_keyed_arms()?),
            Some(Token::KeywordIf) if discriminant.is_none() => {
                MatchArms::Guards(self.parse_guards()?)
            }
            _ if discriminant.is_some() => return Err(self.unexpected(&["`{`"])),
            _ => return Err(self.unexpected(&["`{`", "`if`", "`by`"])),
        };

        Ok(MatchExpr {
            range: self.range_from(start),
            scrutinee: self.scope.to_scope(scrutinee),
            discriminant,
            arms,
        })
    }

    fn parse_keyed_arms(&mut self) -> ParseResult<&'arena [KeyedArm<'arena>]> {
        self.expect(Token::OpenBrace)?;
        let mut arms = Vec::new();
        while !self.check(&Token::CloseBrace) {
            let start = self.peek_start();
            let key = self.parse_key()?;
            self.expect(Token::EqualsGreater)?;
            let handler = self.parse_term()?;
            arms.push(KeyedArm {
                range: self.range_from(start),
                key,
                handler,
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::CloseBrace)?;
        Ok(alloc::slice_from_iter(self.scope, arms))
    }

    fn parse_key(&mut self) -> ParseResult<(ByteRange, Key)> {
        let start = self.peek_start();
        if self.eat(&Token::Underscore) {
            return Ok((self.range_from(start), Key::Placeholder));
        }
        if let Some(literal) = self.parse_literal() {
            return Ok((self.range_from(start), Key::Literal(literal)));
        }
        match self.expect_label() {
            Ok((range, label)) => Ok((range, Key::Name(label))),
            Err(_) => Err(self.unexpected(&["key", "`_`"])),
        }
    }

    fn parse_guards(&mut self) -> ParseResult<&'arena [Guard<'arena>]> {
        self.expect(Token::KeywordIf)?;
        self.expect(Token::OpenBracket)?;
        let mut guards = Vec::new();
        while !self.check(&Token::CloseBracket) {
            guards.push(self.parse_guard()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::CloseBracket)?;
        Ok(alloc::slice_from_iter(self.scope, guards))
    }

    /// A parenthesised tuple of terms. Any other term is a guard with a
    /// single element.
    fn parse_guard(&mut self) -> ParseResult<Guard<'arena>> {
        let start = self.peek_start();
        if !self.eat(&Token::OpenParen) {
            let term = self.parse_term()?;
            return Ok(Guard {
                range: self.range_from(start),
                elems: alloc::slice_from_iter(self.scope, [term]),
            });
        }

        let mut elems = Vec::new();
        while !self.check(&Token::CloseParen) {
            elems.push(self.parse_term()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::CloseParen)?;
        Ok(Guard {
            range: self.range_from(start),
            elems: alloc::slice_from_iter(self.scope, elems),
        })
    }
}

fn quoted(token: &Token<'_>) -> String {
    match token {
        Token::Name(_) | Token::StringLiteral(_) | Token::NumberLiteral(_) => {
            token.description().to_owned()
        }
        _ => format!("`{}`", token.description()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_id() -> FileId {
        FileId::try_from(1).unwrap()
    }

    fn parse<'arena>(
        scope: &'arena Scope<'arena>,
        source: &str,
    ) -> (Module<'arena>, Vec<ParseMessage>) {
        Parser::new(scope, file_id(), source).parse_module()
    }

    fn only_def<'a, 'arena>(module: &'a Module<'arena>) -> &'a Def<'arena> {
        match module.items {
            [Item::Def(def)] => def,
            items => panic!("expected a single definition, found {items:?}"),
        }
    }

    #[test]
    fn type_definitions() {
        let scope = Scope::new();
        let (module, messages) = parse(
            &scope,
            r#"type Shape = | { kind: "circle", radius: Int } | { kind: "square", side: Int };
               type Status = 200 | 404;
               type Name = String;"#,
        );
        assert_eq!(messages, vec![]);
        assert_eq!(module.items.len(), 3);

        match &module.items[0] {
            Item::Type(TypeDef { name, r#type: Type::Union(_, members), .. }) => {
                assert_eq!(name.1, Symbol::intern("Shape"));
                assert_eq!(members.len(), 2);
                assert!(matches!(members[0], Type::Record(_, fields) if fields.len() == 2));
            }
            item => panic!("unexpected item {item:?}"),
        }
        match &module.items[2] {
            Item::Type(TypeDef { r#type, .. }) => {
                assert!(matches!(r#type, Type::Name(_, name) if *name == Symbol::intern("String")));
            }
            item => panic!("unexpected item {item:?}"),
        }
    }

    #[test]
    fn keyed_matches() {
        let scope = Scope::new();
        let (module, messages) = parse(
            &scope,
            r#"def f = match (s : Shape) by kind { circle => on.circle, "sq" => g(x), 3 => h, _ => w, };"#,
        );
        assert_eq!(messages, vec![]);
        let def = only_def(&module);
        assert!(matches!(def.expr.scrutinee, Term::Ann(..)));
        assert_eq!(def.expr.discriminant.map(|(_, label)| label), Some(Symbol::intern("kind")));

        let arms = match def.expr.arms {
            MatchArms::Keyed(arms) => arms,
            MatchArms::Guards(_) => panic!("expected keyed arms"),
        };
        let keys = arms.iter().map(|arm| arm.key.1).collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                Key::Name(Symbol::intern("circle")),
                Key::Literal(Literal::String(Symbol::intern("sq"))),
                Key::Literal(Literal::Number(Symbol::intern("3"))),
                Key::Placeholder,
            ],
        );
        assert!(matches!(arms[0].handler, Term::Proj(..)));
        assert!(matches!(arms[1].handler, Term::App(..)));
    }

    #[test]
    fn keywords_as_keys() {
        let scope = Scope::new();
        let (module, messages) = parse(&scope, "def f = match x { type => a, true => b };");
        assert_eq!(messages, vec![]);
        match only_def(&module).expr.arms {
            MatchArms::Keyed(arms) => {
                assert_eq!(arms[0].key.1, Key::Name(Symbol::intern("type")));
                assert_eq!(arms[1].key.1, Key::Literal(Literal::Bool(true)));
            }
            MatchArms::Guards(_) => panic!("expected keyed arms"),
        }
    }

    #[test]
    fn guards() {
        let scope = Scope::new();
        let (module, messages) =
            parse(&scope, "def f = match n if [(is_small, small), (a, b, c), lone];");
        assert_eq!(messages, vec![]);
        match only_def(&module).expr.arms {
            MatchArms::Guards(guards) => {
                let lens = guards.iter().map(|guard| guard.elems.len()).collect::<Vec<_>>();
                assert_eq!(lens, vec![2, 3, 1]);
            }
            MatchArms::Keyed(_) => panic!("expected guards"),
        }
    }

    #[test]
    fn ranges() {
        let scope = Scope::new();
        let source = "def f = match x { a => g };";
        let (module, _) = parse(&scope, source);
        let def = only_def(&module);
        assert_eq!(def.range, ByteRange::new(file_id(), 0, 27));
        assert_eq!(def.expr.range, ByteRange::new(file_id(), 8, 26));
        assert_eq!(def.expr.scrutinee.range(), ByteRange::new(file_id(), 14, 15));
    }

    #[test]
    fn recovers_at_semicolons() {
        let scope = Scope::new();
        let (module, messages) = parse(
            &scope,
            "def a = match x { 1 => f };\ndef b = ;\ndef c = match y if [(p, f)];",
        );
        assert_eq!(module.items.len(), 2);
        assert_eq!(
            messages,
            vec![ParseMessage::UnexpectedToken {
                range: ByteRange::new(file_id(), 36, 37),
                token: "`;`".to_owned(),
                expected: vec!["`match`".to_owned()],
            }],
        );
    }

    #[test]
    fn unexpected_end_of_file() {
        let scope = Scope::new();
        let (module, messages) = parse(&scope, "def a = match x {");
        assert!(module.items.is_empty());
        assert!(matches!(
            messages.as_slice(),
            [ParseMessage::UnexpectedEof { range, .. }] if range.start() == 17
        ));
    }

    #[test]
    fn lexer_errors_are_reported() {
        let scope = Scope::new();
        let (module, messages) = parse(&scope, "def a = match x # { y => z };");
        assert_eq!(module.items.len(), 1);
        assert!(matches!(messages.as_slice(), [ParseMessage::Lexer(_)]));
    }
}
