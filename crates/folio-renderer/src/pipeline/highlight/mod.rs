//! Regex-driven syntax highlighting.
//!
//! Each [`Language`] has a [`Grammar`]: an ordered list of anchored rules
//! tried at every position. The first rule that matches wins; characters no
//! rule matches are emitted as plain text.

mod language;

use regex::Regex;

pub use language::Language;

use crate::node::{Node, NodeError, Token, TokenClass};

use super::{StageContext, rewrite};

pub(super) fn apply(nodes: Vec<Node>, ctx: &mut StageContext<'_>) -> Vec<Node> {
    rewrite(nodes, &mut |node| {
        Some(match node {
            Node::CodeBlock {
                language: Some(language),
                source,
                live,
            } => match Language::parse(&language) {
                Some(lang) => Node::HighlightedCode {
                    tokens: highlight(lang, &source),
                    language,
                    source,
                    live,
                },
                None => {
                    let error = NodeError::HighlightUnsupported {
                        language: language.clone(),
                    };
                    let fallback = Node::CodeBlock {
                        language: Some(language),
                        source,
                        live,
                    };
                    ctx.degrade(fallback, error)
                }
            },
            other => other,
        })
    })
}

/// Tokenize source code into styled spans.
///
/// Adjacent spans of the same class are merged. Concatenating the token texts
/// reproduces `source` exactly.
#[must_use]
pub fn highlight(language: Language, source: &str) -> Vec<Token> {
    let grammar = language.grammar();
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;
    // Only whitespace precedes `pos` on its line.
    let mut line_start = true;

    while pos < source.len() {
        let rest = &source[pos..];
        let matched = grammar
            .rules
            .iter()
            .find_map(|rule| rule.try_match(rest, line_start, grammar.keywords));

        let (class, len) = matched.unwrap_or_else(|| {
            let len = rest.chars().next().map_or(1, char::len_utf8);
            (TokenClass::Plain, len)
        });
        let text = &rest[..len];
        line_start = match text.rfind('\n') {
            Some(newline) => text[newline + 1..].trim().is_empty(),
            None => line_start && text.trim().is_empty(),
        };
        push_token(&mut tokens, class, text);
        pos += len;
    }

    tokens
}

fn push_token(tokens: &mut Vec<Token>, class: TokenClass, text: &str) {
    if let Some(last) = tokens.last_mut()
        && last.class == class
    {
        last.text.push_str(text);
        return;
    }
    tokens.push(Token {
        class,
        text: text.to_owned(),
    });
}

/// How a rule's match is classified.
enum RuleKind {
    Fixed(TokenClass),
    /// Keyword, function call or plain identifier.
    Identifier,
    /// Classified by the next non-blank character after the match. With no
    /// `otherwise` class the rule only matches when followed.
    Followed {
        follow: &'static [char],
        class: TokenClass,
        otherwise: Option<TokenClass>,
    },
}

struct Rule {
    pattern: Regex,
    kind: RuleKind,
    line_start: bool,
}

impl Rule {
    fn try_match(
        &self,
        rest: &str,
        line_start: bool,
        keywords: &[&str],
    ) -> Option<(TokenClass, usize)> {
        if self.line_start && !line_start {
            return None;
        }
        let m = self.pattern.find(rest).filter(|m| !m.is_empty())?;
        let text = m.as_str();
        let next = rest[m.end()..].trim_start_matches([' ', '\t']).chars().next();

        let class = match &self.kind {
            RuleKind::Fixed(class) => *class,
            RuleKind::Identifier => {
                if keywords.contains(&text) {
                    TokenClass::Keyword
                } else if next == Some('(') {
                    TokenClass::Function
                } else {
                    TokenClass::Plain
                }
            }
            RuleKind::Followed {
                follow,
                class,
                otherwise,
            } => {
                if next.is_some_and(|c| follow.contains(&c)) {
                    *class
                } else {
                    (*otherwise)?
                }
            }
        };
        Some((class, m.end()))
    }
}

/// Ordered rule set for one language.
pub(crate) struct Grammar {
    rules: Vec<Rule>,
    keywords: &'static [&'static str],
}

impl Grammar {
    fn new(keywords: &'static [&'static str]) -> Self {
        Self {
            rules: Vec::new(),
            keywords,
        }
    }

    fn push(mut self, pattern: &str, kind: RuleKind, line_start: bool) -> Self {
        let pattern = Regex::new(&format!("^(?:{pattern})")).expect("invalid highlight regex");
        self.rules.push(Rule {
            pattern,
            kind,
            line_start,
        });
        self
    }

    fn rule(self, class: TokenClass, pattern: &str) -> Self {
        self.push(pattern, RuleKind::Fixed(class), false)
    }

    fn line_rule(self, class: TokenClass, pattern: &str) -> Self {
        self.push(pattern, RuleKind::Fixed(class), true)
    }

    fn identifier(self, pattern: &str) -> Self {
        self.push(pattern, RuleKind::Identifier, false)
    }

    fn followed(
        self,
        pattern: &str,
        follow: &'static [char],
        class: TokenClass,
        otherwise: Option<TokenClass>,
    ) -> Self {
        self.push(
            pattern,
            RuleKind::Followed {
                follow,
                class,
                otherwise,
            },
            false,
        )
    }
}
