//! Deffix Parser
//!
//! Converts source text into [`Expr`] trees. Top-level forms keep their span
//! so later failures can point back at the form that caused them. The parser
//! is purely syntactic; operator placement is resolved by the rewrite engine.

use crate::ast::{Expr, Span, Spanned};
use crate::errors::{DeffixError, ErrorReporting, SourceContext};
use crate::syntax::{REGISTER_OPERATOR, SET_PRECEDENCE};
use pest::{error::Error, iterators::Pair, Parser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct DeffixParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse source text into spanned top-level expressions.
pub fn parse(source_text: &str, source: &SourceContext) -> Result<Vec<Spanned<Expr>>, DeffixError> {
    if source_text.trim().is_empty() {
        return Ok(vec![]);
    }

    let mut pairs = DeffixParser::parse(Rule::program, source_text)
        .map_err(|e| convert_parse_error(e, source))?;

    let Some(program) = pairs.next() else {
        return Ok(vec![]);
    };

    program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| {
            let span = get_span(&p);
            build_expr(p, source).map(|value| Spanned { value, span })
        })
        .collect()
}

/// Parse an anonymous snippet, dropping spans.
///
/// # Examples
///
/// ```rust
/// use deffix::syntax::parse_str;
/// let exprs = parse_str("(1 + 2) [x]").unwrap();
/// assert_eq!(exprs.len(), 2);
/// assert_eq!(exprs[1].pretty(), "[x]");
/// ```
pub fn parse_str(source_text: &str) -> Result<Vec<Expr>, DeffixError> {
    let source = SourceContext::from_file("<input>", source_text);
    Ok(parse(source_text, &source)?
        .into_iter()
        .map(|spanned| spanned.value)
        .collect())
}

// ============================================================================
// AST BUILDERS
// ============================================================================

fn build_expr(pair: Pair<Rule>, source: &SourceContext) -> Result<Expr, DeffixError> {
    let span = get_span(&pair);

    match pair.as_rule() {
        Rule::number => {
            let text = pair.as_str();
            text.parse::<f64>()
                .map(Expr::Number)
                .map_err(|_| source.invalid_literal("number", text, span))
        }

        Rule::boolean => match pair.as_str() {
            "true" => Ok(Expr::Bool(true)),
            "false" => Ok(Expr::Bool(false)),
            text => Err(source.invalid_literal("boolean", text, span)),
        },

        Rule::nil => Ok(Expr::Nil),

        Rule::string => Ok(Expr::String(unescape_string(pair.as_str()))),

        Rule::symbol => Ok(Expr::symbol(pair.as_str())),

        Rule::list => Ok(Expr::form(build_children(pair, source)?)),

        Rule::sequence => Ok(Expr::sequence(build_children(pair, source)?)),

        Rule::reader => build_reader(pair, source),

        rule => Err(source.malformed(&format!("unsupported rule: {:?}", rule), span)),
    }
}

fn build_children(pair: Pair<Rule>, source: &SourceContext) -> Result<Vec<Expr>, DeffixError> {
    pair.into_inner().map(|p| build_expr(p, source)).collect()
}

/// `#>x` becomes `(register-operator x)`, `#>[a b]` becomes
/// `(register-operator a b)`; `#<` does the same for `defprecedence`.
fn build_reader(pair: Pair<Rule>, source: &SourceContext) -> Result<Expr, DeffixError> {
    let span = get_span(&pair);
    let mut inner = pair.into_inner();

    let directive = match inner.next().map(|tag| tag.as_str()) {
        Some("#>") => REGISTER_OPERATOR,
        Some("#<") => SET_PRECEDENCE,
        _ => return Err(source.malformed("reader shorthand", span)),
    };
    let target = inner
        .next()
        .ok_or_else(|| source.missing_element("expression after reader shorthand", span))?;
    let target = build_expr(target, source)?;

    let mut items = vec![Expr::symbol(directive)];
    match target {
        Expr::List(elements, _) => items.extend(elements),
        single => items.push(single),
    }
    Ok(Expr::form(items))
}

// ============================================================================
// UTILITIES
// ============================================================================

fn get_span(pair: &Pair<Rule>) -> Span {
    Span {
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    }
}

fn unescape_string(text: &str) -> String {
    // Remove surrounding quotes
    let inner = &text[1..text.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: Error<Rule>, source: &SourceContext) -> DeffixError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => Span { start: pos, end: pos },
        pest::error::InputLocation::Span((start, end)) => Span { start, end },
    };

    let rendered = error.to_string();
    let message = if unbalanced(&source.content, '(', ')') {
        "expression: missing closing parenthesis"
    } else if unbalanced(&source.content, '[', ']') {
        "sequence: missing closing bracket"
    } else if rendered.contains("string") {
        "string literal"
    } else {
        "syntax"
    };

    source.malformed(message, span)
}

fn unbalanced(text: &str, open: char, close: char) -> bool {
    let opens = text.chars().filter(|c| *c == open).count();
    let closes = text.chars().filter(|c| *c == close).count();
    opens > closes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ListKind;
    use crate::errors::ErrorKind;

    fn parse_one(text: &str) -> Expr {
        let mut exprs = parse_str(text).unwrap();
        assert_eq!(exprs.len(), 1, "expected a single form in {:?}", text);
        exprs.remove(0)
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_str("").unwrap().is_empty());
        assert!(parse_str("  ; only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_one("42"), Expr::Number(42.0));
        assert_eq!(parse_one("-2.5"), Expr::Number(-2.5));
        assert_eq!(parse_one("true"), Expr::Bool(true));
        assert_eq!(parse_one("nil"), Expr::Nil);
        assert_eq!(parse_one("\"a\\nb\""), Expr::String("a\nb".into()));
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(parse_one("-"), Expr::symbol("-"));
        assert_eq!(parse_one("<="), Expr::symbol("<="));
        assert_eq!(parse_one("defprecedence+"), Expr::symbol("defprecedence+"));
        assert_eq!(parse_one("truthy"), Expr::symbol("truthy"));
        assert_eq!(parse_one("1+"), Expr::symbol("1+"));
    }

    #[test]
    fn test_lists_keep_their_kind() {
        let expr = parse_one("(1 [2 3] +)");
        let (items, kind) = expr.as_list().unwrap();
        assert_eq!(kind, ListKind::Form);
        assert_eq!(items[1].as_list().unwrap().1, ListKind::Sequence);
    }

    #[test]
    fn test_reader_shorthands() {
        assert_eq!(parse_one("#>implies").pretty(), "(register-operator implies)");
        assert_eq!(parse_one("#>[and or]").pretty(), "(register-operator and or)");
        assert_eq!(parse_one("#<[* +]").pretty(), "(defprecedence * +)");
    }

    #[test]
    fn test_spans_cover_top_level_forms() {
        let source = SourceContext::from_file("test", "(a b) c");
        let forms = parse("(a b) c", &source).unwrap();
        assert_eq!(forms[0].span, Span { start: 0, end: 5 });
        assert_eq!(forms[1].span, Span { start: 6, end: 7 });
    }

    #[test]
    fn test_unmatched_paren() {
        let err = parse_str("(a b").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedConstruct { .. }));
        assert!(err.to_string().contains("parenthesis"));
        assert!(err.source_info.is_some());
    }
}
