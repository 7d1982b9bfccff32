use tracing::warn;

use crate::diagnostics::Diagnostic;

use super::token::{
    DepthCounters, Token, TokenKind, GROUPINGS, KEYWORDS, ONE_SYMBOL_OPERATORS,
    TWO_SYMBOL_OPERATORS,
};

/// Characters that terminate an error run.
const RESERVED: &str = "(){}[]+-*/<>=,;";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LexOptions {
    /// Do not report lexical errors as they are found.
    pub silent: bool,
    pub ignore_whitespace: bool,
    pub ignore_comments: bool,
}

impl Default for LexOptions {
    fn default() -> Self {
        Self {
            silent: false,
            ignore_whitespace: true,
            ignore_comments: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct Lexer {
    depth: DepthCounters,
    errors: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> DepthCounters {
        self.depth
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Diagnostic> {
        self.errors
    }

    fn new_token(
        &self,
        kind: TokenKind,
        lexeme: &str,
        line: usize,
        tokens: &mut Vec<Token>,
        options: LexOptions,
    ) {
        match kind {
            TokenKind::Whitespace if options.ignore_whitespace => (),
            TokenKind::Comment if options.ignore_comments => (),
            _ => tokens.push(Token::new(kind, lexeme, line, self.depth)),
        }
    }

    fn report(&mut self, lexeme: &str, line: usize, options: LexOptions) {
        let diagnostic = Diagnostic::lexical(lexeme, line);
        if !options.silent {
            warn!("{}", diagnostic);
        }
        self.errors.push(diagnostic);
    }

    /// Tokenizes one line, updating the depth counters as groupings and
    /// comment delimiters go by. Unrecognized runs are reported and dropped.
    pub fn tokenize_line(&mut self, text: &str, line: usize, options: LexOptions) -> Vec<Token> {
        let chars: Vec<_> = text.chars().collect();
        let mut tokens = vec![];
        let mut index = 0;

        while index < chars.len() {
            let (kind, len) = scan(&chars[index..]);
            let lexeme: String = chars[index..index + len].iter().collect();
            index += len;

            match kind {
                TokenKind::Comment if lexeme == "/*" => {
                    self.depth.comment += 1;
                    self.new_token(TokenKind::Comment, &lexeme, line, &mut tokens, options);
                }
                TokenKind::Comment => {
                    if self.depth.comment > 0 {
                        self.depth.comment -= 1;
                        self.new_token(TokenKind::Comment, &lexeme, line, &mut tokens, options);
                    } else {
                        self.new_token(TokenKind::Operator, "*", line, &mut tokens, options);
                        self.new_token(TokenKind::Operator, "/", line, &mut tokens, options);
                    }
                }
                TokenKind::Whitespace => {
                    self.new_token(kind, &lexeme, line, &mut tokens, options);
                }
                _ if self.depth.comment > 0 => {
                    self.new_token(TokenKind::Comment, &lexeme, line, &mut tokens, options);
                }
                TokenKind::Grouping => {
                    if let Some(grouping) = lexeme.chars().next().and_then(|c| GROUPINGS.get(&c)) {
                        self.depth.apply(*grouping);
                    }
                    self.new_token(kind, &lexeme, line, &mut tokens, options);
                }
                TokenKind::Number => {
                    self.new_token(refine_number(&lexeme), &lexeme, line, &mut tokens, options);
                }
                TokenKind::Error => self.report(&lexeme, line, options),
                _ => self.new_token(kind, &lexeme, line, &mut tokens, options),
            }
        }

        tokens
    }

    /// Tokenizes a whole source text, numbering lines from 1.
    pub fn tokenize(source: &str, options: LexOptions) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut lexer = Lexer::new();
        let mut tokens = vec![];
        for (i, line) in source.lines().enumerate() {
            tokens.extend(lexer.tokenize_line(line, i + 1, options));
        }
        (tokens, lexer.into_errors())
    }
}

/// Classifies the lexeme starting at `chars[0]` and returns its length.
/// `chars` must not be empty.
fn scan(chars: &[char]) -> (TokenKind, usize) {
    let c = chars[0];
    let next = chars.get(1).copied();

    if (c == '/' && next == Some('*')) || (c == '*' && next == Some('/')) {
        return (TokenKind::Comment, 2);
    }
    if GROUPINGS.contains_key(&c) {
        return (TokenKind::Grouping, 1);
    }
    if c.is_ascii_alphabetic() {
        let len = run(chars, 0, |c| c.is_ascii_alphabetic());
        let word: String = chars[..len].iter().collect();
        let kind = if KEYWORDS.contains_key(word.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        return (kind, len);
    }
    if c.is_ascii_digit() {
        return (TokenKind::Number, scan_number(chars));
    }
    if let Some(next) = next {
        let pair: String = [c, next].iter().collect();
        if TWO_SYMBOL_OPERATORS.contains_key(pair.as_str()) {
            return (TokenKind::Operator, 2);
        }
    }
    if ONE_SYMBOL_OPERATORS.contains_key(&c) {
        return (TokenKind::Operator, 1);
    }
    if c.is_whitespace() {
        return (TokenKind::Whitespace, run(chars, 0, char::is_whitespace));
    }

    let len = run(chars, 0, |c| !c.is_whitespace() && !RESERVED.contains(c));
    (TokenKind::Error, len.max(1))
}

fn run(chars: &[char], from: usize, pred: impl Fn(char) -> bool) -> usize {
    from + chars[from..].iter().take_while(|&&c| pred(c)).count()
}

/// digits ('.' digits)? ([eE] [+-]? digits)?
fn scan_number(chars: &[char]) -> usize {
    let is_digit = |c: char| c.is_ascii_digit();
    let mut len = run(chars, 0, is_digit);

    if chars.get(len) == Some(&'.') && chars.get(len + 1).is_some_and(|c| c.is_ascii_digit()) {
        len = run(chars, len + 1, is_digit);
    }
    if matches!(chars.get(len), Some('e' | 'E')) {
        let mut exponent = len + 1;
        if matches!(chars.get(exponent), Some('+' | '-')) {
            exponent += 1;
        }
        if chars.get(exponent).is_some_and(|c| c.is_ascii_digit()) {
            len = run(chars, exponent, is_digit);
        }
    }
    len
}

fn refine_number(lexeme: &str) -> TokenKind {
    if lexeme.contains(['.', 'e', 'E']) {
        TokenKind::Float
    } else {
        TokenKind::Integer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(line: &str) -> Vec<Token> {
        Lexer::new().tokenize_line(line, 1, LexOptions::default())
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_line() {
        assert!(lex("").is_empty());
    }

    #[test]
    fn declaration() {
        let tokens = lex("int main(void)");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Grouping,
                TokenKind::Keyword,
                TokenKind::Grouping
            ]
        );
        assert_eq!(tokens[1].lexeme, "main");
    }

    #[test]
    fn keyword_prefix_is_identifier() {
        let tokens = lex("iffy intx");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Identifier]);
    }

    #[test]
    fn identifiers_are_letters_only() {
        let tokens = lex("x1");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Integer]);
    }

    #[test]
    fn numbers_are_refined() {
        let tokens = lex("12 3.5 1e10 2.5E-3 7.");
        let pairs: Vec<_> = tokens.iter().map(|t| (t.kind, t.lexeme.as_str())).collect();
        assert_eq!(
            pairs[..4],
            [
                (TokenKind::Integer, "12"),
                (TokenKind::Float, "3.5"),
                (TokenKind::Float, "1e10"),
                (TokenKind::Float, "2.5E-3"),
            ]
        );
        // the trailing '.' is not part of any class
        assert_eq!(pairs[4], (TokenKind::Integer, "7"));
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn two_symbol_operators_win() {
        let tokens = lex("a<=b!=c=d");
        let ops: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(ops, vec!["<=", "!=", "="]);
    }

    #[test]
    fn error_run_is_reported_and_dropped() {
        let mut lexer = Lexer::new();
        let tokens = lexer.tokenize_line("x = $ + 1;", 4, LexOptions::default());
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Error));
        assert_eq!(lexer.errors().len(), 1);
        assert_eq!(lexer.errors()[0].lexeme, "$");
        assert_eq!(lexer.errors()[0].line, 4);
    }

    #[test]
    fn error_run_is_maximal() {
        let mut lexer = Lexer::new();
        let tokens = lexer.tokenize_line("a$b9!c;", 1, LexOptions::default());
        assert_eq!(lexer.errors()[0].lexeme, "$b9!c");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Grouping]);
    }

    #[test]
    fn whitespace_is_kept_on_request() {
        let options = LexOptions {
            ignore_whitespace: false,
            ..LexOptions::default()
        };
        let tokens = Lexer::new().tokenize_line("a  b", 1, options);
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Identifier, TokenKind::Whitespace, TokenKind::Identifier]
        );
        assert_eq!(tokens[1].lexeme, "  ");
    }

    #[test]
    fn comments_span_lines() {
        let options = LexOptions {
            ignore_comments: false,
            ..LexOptions::default()
        };
        let mut lexer = Lexer::new();
        let first = lexer.tokenize_line("x /* a $ (", 1, options);
        assert_eq!(
            kinds(&first),
            vec![
                TokenKind::Identifier,
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::Comment,
                TokenKind::Comment
            ]
        );
        assert_eq!(lexer.depth().comment, 1);
        // groupings inside a comment leave the counters alone
        assert_eq!(lexer.depth().paren, 0);
        assert!(lexer.errors().is_empty());

        let second = lexer.tokenize_line("b */ y", 2, LexOptions::default());
        assert_eq!(kinds(&second), vec![TokenKind::Identifier]);
        assert_eq!(second[0].lexeme, "y");
        assert_eq!(lexer.depth().comment, 0);
    }

    #[test]
    fn comments_nest() {
        let mut lexer = Lexer::new();
        let tokens = lexer.tokenize_line("/* /* */ a */ b", 1, LexOptions::default());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].lexeme, "b");
    }

    #[test]
    fn stray_comment_close_becomes_operators() {
        let tokens = lex("a */ b");
        let pairs: Vec<_> = tokens.iter().map(|t| (t.kind, t.lexeme.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Operator, "*"),
                (TokenKind::Operator, "/"),
                (TokenKind::Identifier, "b"),
            ]
        );
    }

    #[test]
    fn depths_are_stamped() {
        let tokens = lex("{ f(a[1], b) }");
        let depth_of = |lexeme: &str| {
            let t = tokens.iter().find(|t| t.lexeme == lexeme).unwrap();
            (t.brace_depth, t.bracket_depth, t.paren_depth)
        };
        assert_eq!(depth_of("f"), (1, 0, 0));
        assert_eq!(depth_of("1"), (1, 1, 1));
        assert_eq!(depth_of(","), (1, 0, 1));
        assert_eq!(depth_of(")"), (1, 0, 0));
        assert_eq!(depth_of("}"), (0, 0, 0));
    }

    #[test]
    fn unbalanced_depth_carries_to_next_line() {
        let mut lexer = Lexer::new();
        lexer.tokenize_line("{ {", 1, LexOptions::default());
        let tokens = lexer.tokenize_line("x", 2, LexOptions::default());
        assert_eq!(tokens[0].brace_depth, 2);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn tokenize_numbers_lines() {
        let (tokens, errors) = Lexer::tokenize("int x;\n\nx = 1;", LexOptions::default());
        assert!(errors.is_empty());
        assert_eq!(tokens.first().map(|t| t.line), Some(1));
        assert_eq!(tokens.last().map(|t| t.line), Some(3));
    }
}
