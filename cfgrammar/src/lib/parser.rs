use std::{error::Error, fmt};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    ast::{GrammarAST, Symbol},
    NewlineCache, Span, Spanned,
};

type GrammarResult<T> = Result<T, GrammarError>;

/// The various different possible grammar errors.
#[derive(Debug, PartialEq, Eq)]
pub enum GrammarErrorKind {
    IllegalName,
    IllegalString,
    IncompleteRule,
    IncompleteComment,
    MissingColon,
    PrematureEnd,
    ProgramsNotSupported,
    UnknownDeclaration,
    /// Contains the span of the first `%start` declaration.
    DuplicateStartDeclaration(Span),
    NoStartRule,
    InvalidStartRule(String),
    UnknownRuleRef(String),
    /// The grammar has more rules, tokens, productions, or symbols in a production than the
    /// chosen index storage type can represent.
    StorageTooSmall,
}

/// Any error from reading or validating a grammar returns an instance of this struct.
#[derive(Debug, PartialEq, Eq)]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    pub span: Span,
}

impl Error for GrammarError {}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Spanned for GrammarError {
    fn span(&self) -> Span {
        self.span
    }
}

impl GrammarError {
    /// Render this error prefixed by the line and column in `src` it refers to.
    pub fn pp(&self, src: &str) -> String {
        let nlc = NewlineCache::from_input(src);
        match nlc.byte_to_line_and_col(src, self.span.start()) {
            Some((line, col)) => format!("{}:{}: {}", line, col, self),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for GrammarErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            GrammarErrorKind::IllegalName => "Illegal name",
            GrammarErrorKind::IllegalString => "Illegal string",
            GrammarErrorKind::IncompleteRule => "Incomplete rule",
            GrammarErrorKind::IncompleteComment => "Incomplete comment",
            GrammarErrorKind::MissingColon => "Missing ':'",
            GrammarErrorKind::PrematureEnd => "File ends prematurely",
            GrammarErrorKind::ProgramsNotSupported => "Programs not supported",
            GrammarErrorKind::UnknownDeclaration => "Unknown declaration",
            GrammarErrorKind::DuplicateStartDeclaration(_) => "Duplicated %start declaration",
            GrammarErrorKind::NoStartRule => "No start rule specified",
            GrammarErrorKind::InvalidStartRule(name) => {
                return write!(f, "Start rule '{}' does not appear in grammar", name);
            }
            GrammarErrorKind::UnknownRuleRef(name) => {
                return write!(f, "Unknown reference to rule '{}'", name);
            }
            GrammarErrorKind::StorageTooSmall => "Grammar is too big for its index type",
        };
        write!(f, "{}", s)
    }
}

lazy_static! {
    static ref RE_NAME: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").unwrap();
    static ref RE_TOKEN: Regex =
        Regex::new("^(?:(\".+?\")|('.+?')|([a-zA-Z_][a-zA-Z_0-9]*))").unwrap();
}

/// Reads the textual grammar format:
///
/// ```text
/// %start S
/// %token A B
/// %%
/// S: A S 'c' | ;
/// ```
///
/// Every `%token` declared name, and every quoted name, is a token; every other name is a rule.
pub(crate) struct GrammarParser {
    src: String,
    ast: GrammarAST,
}

impl GrammarParser {
    pub(crate) fn new(src: String) -> GrammarParser {
        GrammarParser {
            src,
            ast: GrammarAST::new(),
        }
    }

    pub(crate) fn parse(&mut self) -> GrammarResult<usize> {
        // `i` is always a byte index into `self.src` which lies on a UTF-8 character boundary.
        let i = self.parse_declarations(0)?;
        self.parse_rules(i)
    }

    pub(crate) fn ast(self) -> GrammarAST {
        self.ast
    }

    fn parse_declarations(&mut self, mut i: usize) -> GrammarResult<usize> {
        i = self.parse_ws(i)?;
        while i < self.src.len() {
            if self.lookahead_is("%%", i).is_some() {
                return Ok(i);
            }
            if let Some(j) = self.lookahead_is("%token", i) {
                i = self.parse_ws(j)?;
                while i < self.src.len() && self.lookahead_is("%", i).is_none() {
                    let (j, n, span) = self.parse_token(i)?;
                    self.ast.add_token(n, span);
                    i = self.parse_ws(j)?;
                }
                continue;
            }
            if let Some(j) = self.lookahead_is("%start", i) {
                i = self.parse_ws(j)?;
                let (j, n) = self.parse_name(i)?;
                let span = Span::new(i, j);
                if let Some((_, orig_span)) = self.ast.start {
                    return Err(GrammarError {
                        kind: GrammarErrorKind::DuplicateStartDeclaration(orig_span),
                        span,
                    });
                }
                self.ast.start = Some((n, span));
                i = self.parse_ws(j)?;
                continue;
            }
            return Err(self.mk_error(GrammarErrorKind::UnknownDeclaration, i));
        }
        Err(self.mk_error(GrammarErrorKind::PrematureEnd, i))
    }

    fn parse_rules(&mut self, mut i: usize) -> GrammarResult<usize> {
        // parse_declarations has left the input at '%%'
        i = self.lookahead_is("%%", i).unwrap_or(i);
        i = self.parse_ws(i)?;
        while i < self.src.len() {
            if self.lookahead_is("%%", i).is_some() {
                return Err(self.mk_error(GrammarErrorKind::ProgramsNotSupported, i));
            }
            i = self.parse_rule(i)?;
            i = self.parse_ws(i)?;
        }
        Ok(i)
    }

    fn parse_rule(&mut self, mut i: usize) -> GrammarResult<usize> {
        let (j, rn) = self.parse_name(i)?;
        let span = Span::new(i, j);
        if self.ast.start.is_none() {
            self.ast.start = Some((rn.clone(), span));
        }
        self.ast.add_rule((rn.clone(), span));
        i = self.parse_ws(j)?;
        match self.lookahead_is(":", i) {
            Some(j) => i = j,
            None => return Err(self.mk_error(GrammarErrorKind::MissingColon, i)),
        }
        let mut syms = Vec::new();
        i = self.parse_ws(i)?;
        while i < self.src.len() {
            if let Some(j) = self.lookahead_is("|", i) {
                self.ast.add_prod(&rn, syms);
                syms = Vec::new();
                i = self.parse_ws(j)?;
                continue;
            } else if let Some(j) = self.lookahead_is(";", i) {
                self.ast.add_prod(&rn, syms);
                return Ok(j);
            }

            let (j, sym, span) = self.parse_token(i)?;
            if self.lookahead_is("\"", i).is_some() || self.lookahead_is("'", i).is_some() {
                self.ast.add_token(sym.clone(), span);
                syms.push(Symbol::Token(sym, span));
            } else if self.ast.has_token(&sym) {
                syms.push(Symbol::Token(sym, span));
            } else {
                syms.push(Symbol::Rule(sym, span));
            }
            i = self.parse_ws(j)?;
        }
        Err(self.mk_error(GrammarErrorKind::IncompleteRule, i))
    }

    fn parse_name(&self, i: usize) -> GrammarResult<(usize, String)> {
        match RE_NAME.find(&self.src[i..]) {
            Some(m) => Ok((i + m.end(), self.src[i..i + m.end()].to_string())),
            None => Err(self.mk_error(GrammarErrorKind::IllegalName, i)),
        }
    }

    /// Parse a (possibly quoted) token name, returning the index after it, its unquoted text,
    /// and the span of that text.
    fn parse_token(&self, i: usize) -> GrammarResult<(usize, String, Span)> {
        match RE_TOKEN.find(&self.src[i..]) {
            Some(m) => {
                if self.src[i..].starts_with(['"', '\'']) {
                    // Both quote characters are one byte long.
                    let start = i + 1;
                    let end = i + m.end() - 1;
                    Ok((
                        i + m.end(),
                        self.src[start..end].to_string(),
                        Span::new(start, end),
                    ))
                } else {
                    Ok((
                        i + m.end(),
                        self.src[i..i + m.end()].to_string(),
                        Span::new(i, i + m.end()),
                    ))
                }
            }
            None if self.src[i..].starts_with(['"', '\'']) => {
                Err(self.mk_error(GrammarErrorKind::IllegalString, i))
            }
            None => Err(self.mk_error(GrammarErrorKind::IllegalName, i)),
        }
    }

    /// Skip whitespace and comments.
    fn parse_ws(&self, mut i: usize) -> GrammarResult<usize> {
        while i < self.src.len() {
            let rest = &self.src[i..];
            if rest.starts_with("//") {
                i += rest.find('\n').map(|off| off + 1).unwrap_or(rest.len());
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(off) => i += off + 4,
                    None => return Err(self.mk_error(GrammarErrorKind::IncompleteComment, i)),
                }
            } else {
                match rest.chars().next() {
                    Some(c) if c.is_whitespace() => i += c.len_utf8(),
                    _ => break,
                }
            }
        }
        Ok(i)
    }

    fn lookahead_is(&self, s: &'static str, i: usize) -> Option<usize> {
        if self.src[i..].starts_with(s) {
            Some(i + s.len())
        } else {
            None
        }
    }

    fn mk_error(&self, kind: GrammarErrorKind, off: usize) -> GrammarError {
        GrammarError {
            kind,
            span: Span::new(off, off),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{GrammarError, GrammarErrorKind, GrammarParser};
    use crate::{
        ast::{GrammarAST, Production, Symbol},
        Span,
    };

    fn parse(s: &str) -> Result<GrammarAST, GrammarError> {
        let mut yp = GrammarParser::new(s.to_string());
        yp.parse()?;
        Ok(yp.ast())
    }

    fn rule(n: &str, start: usize) -> Symbol {
        Symbol::Rule(n.to_string(), Span::new(start, start + n.len()))
    }

    fn token(n: &str, start: usize) -> Symbol {
        Symbol::Token(n.to_string(), Span::new(start, start + n.len()))
    }

    #[test]
    fn test_macro_like_rule() {
        let src = "%%\nA : 'a';";
        let grm = parse(src).unwrap();
        assert_eq!(grm.start, Some(("A".to_string(), Span::new(3, 4))));
        let pidx = grm.get_rule("A").unwrap().pidxs[0];
        assert_eq!(
            grm.prods[pidx],
            Production {
                symbols: vec![token("a", 8)]
            }
        );
    }

    #[test]
    fn test_rule_alternatives_and_empty() {
        let src = "%start A\n%%\nA: 'a' B | ;\nB: 'b';";
        let grm = parse(src).unwrap();
        let pidxs = &grm.get_rule("A").unwrap().pidxs;
        assert_eq!(pidxs.len(), 2);
        assert_eq!(
            grm.prods[pidxs[0]].symbols,
            vec![token("a", 16), rule("B", 19)]
        );
        assert!(grm.prods[pidxs[1]].symbols.is_empty());
        assert_eq!(grm.tokens.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_declared_tokens_come_first() {
        let src = "%token X Y\n%%\nS: 'z' X | Y;";
        let grm = parse(src).unwrap();
        assert_eq!(grm.tokens.iter().collect::<Vec<_>>(), vec!["X", "Y", "z"]);
        let pidxs = &grm.get_rule("S").unwrap().pidxs;
        assert_eq!(grm.prods[pidxs[0]].symbols[1], token("X", 21));
        assert_eq!(grm.prods[pidxs[1]].symbols, vec![token("Y", 25)]);
    }

    #[test]
    fn test_repeated_rule_appends() {
        let grm = parse("%%\nA: 'a';\nA: 'b';").unwrap();
        assert_eq!(grm.rules.len(), 1);
        assert_eq!(grm.get_rule("A").unwrap().pidxs, vec![0, 1]);
    }

    #[test]
    fn test_comments() {
        let src = "// leading\n%start A /* inline */\n%%\nA: /* nothing */ 'a' // trailing\n ;";
        let grm = parse(src).unwrap();
        assert_eq!(grm.prods.len(), 1);
        assert_eq!(grm.prods[0].symbols.len(), 1);
    }

    #[test]
    fn test_incomplete_comment() {
        let e = parse("%%\nA: 'a' /* oops").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::IncompleteComment);
        assert_eq!(e.span, Span::new(10, 10));
    }

    #[test]
    fn test_missing_colon() {
        let e = parse("%%\nA 'a';").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::MissingColon);
        assert_eq!(e.span, Span::new(5, 5));
    }

    #[test]
    fn test_incomplete_rule() {
        let e = parse("%%\nA: 'a' | 'b'").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::IncompleteRule);
    }

    #[test]
    fn test_premature_end() {
        let e = parse("%token a").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::PrematureEnd);
    }

    #[test]
    fn test_unknown_declaration() {
        let e = parse("%nonsense\n%%\nA: 'a';").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::UnknownDeclaration);
        assert_eq!(e.span, Span::new(0, 0));
    }

    #[test]
    fn test_duplicate_start() {
        let e = parse("%start A\n%start B\n%%\nA: 'a';").unwrap_err();
        assert_eq!(
            e.kind,
            GrammarErrorKind::DuplicateStartDeclaration(Span::new(7, 8))
        );
        assert_eq!(e.span, Span::new(16, 17));
    }

    #[test]
    fn test_illegal_string() {
        let e = parse("%%\nA: 'a;").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::IllegalString);
    }

    #[test]
    fn test_programs_not_supported() {
        let e = parse("%%\nA: 'a';\n%%\nfn main() {}").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::ProgramsNotSupported);
    }

    #[test]
    fn test_error_pp() {
        let src = "%%\nA: 'a';\nB 'b';";
        let e = parse(src).unwrap_err();
        assert_eq!(e.pp(src), "3:3: Missing ':'");
    }
}
