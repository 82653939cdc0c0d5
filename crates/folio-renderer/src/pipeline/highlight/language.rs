//! Supported highlight languages and their grammars.

use std::sync::LazyLock;

use super::Grammar;
use crate::node::TokenClass::{Attr, Comment, Function, Keyword, Number, Punctuation, String, Tag};

/// Languages with a highlighting grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
    Python,
    Shell,
    Json,
    Css,
    Html,
    Toml,
    Yaml,
}

impl Language {
    /// Parse a fence language identifier, accepting common aliases.
    ///
    /// Returns `None` for languages without a grammar.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rust" | "rs" => Some(Self::Rust),
            "js" | "javascript" | "mjs" | "cjs" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" | "typescript" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "py" | "python" => Some(Self::Python),
            "sh" | "bash" | "shell" | "zsh" => Some(Self::Shell),
            "json" | "jsonc" => Some(Self::Json),
            "css" => Some(Self::Css),
            "html" | "htm" | "xml" | "svg" => Some(Self::Html),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Canonical language name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Python => "python",
            Self::Shell => "shell",
            Self::Json => "json",
            Self::Css => "css",
            Self::Html => "html",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        }
    }

    pub(super) fn grammar(self) -> &'static Grammar {
        match self {
            Self::Rust => &RUST,
            Self::JavaScript => &JAVASCRIPT,
            Self::Jsx => &JSX,
            Self::TypeScript => &TYPESCRIPT,
            Self::Tsx => &TSX,
            Self::Python => &PYTHON,
            Self::Shell => &SHELL,
            Self::Json => &JSON,
            Self::Css => &CSS,
            Self::Html => &HTML,
            Self::Toml => &TOML,
            Self::Yaml => &YAML,
        }
    }
}

const LINE_COMMENT: &str = r"//[^\n]*";
const BLOCK_COMMENT: &str = r"/\*(?:[\s\S]*?\*/|[\s\S]*)";
const HASH_COMMENT: &str = r"#[^\n]*";
const DQ_STRING: &str = r#""(?:[^"\\\n]|\\.)*"?"#;
const SQ_STRING: &str = r"'(?:[^'\\\n]|\\.)*'?";
const C_NUMBER: &str =
    r"0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+|\d[\d_]*(?:\.\d[\d_]*)?(?:[eE][+-]?\d+)?";
const C_PUNCTUATION: &str = r"[{}()\[\];,.:<>=+\-*/%&|^!?~@#]";

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for", "from",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
    "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var",
    "void", "while", "with", "yield",
];

const TS_KEYWORDS: &[&str] = &[
    "abstract", "any", "as", "async", "await", "boolean", "break", "case", "catch", "class",
    "const", "continue", "declare", "default", "delete", "do", "else", "enum", "export",
    "extends", "false", "finally", "for", "from", "function", "if", "implements", "import", "in",
    "instanceof", "interface", "keyof", "let", "namespace", "never", "new", "null", "number",
    "of", "private", "protected", "public", "readonly", "return", "static", "string", "super",
    "switch", "this", "throw", "true", "try", "type", "typeof", "undefined", "unknown", "var",
    "void", "while", "yield",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "case", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "match", "nonlocal", "not", "or", "pass", "raise", "return",
    "self", "try", "while", "with", "yield",
];

const SHELL_KEYWORDS: &[&str] = &[
    "break", "case", "continue", "declare", "do", "done", "elif", "else", "esac", "exit",
    "export", "fi", "for", "function", "if", "in", "local", "readonly", "return", "select",
    "shift", "then", "until", "unset", "while",
];

const JSON_KEYWORDS: &[&str] = &["true", "false", "null"];

const CSS_KEYWORDS: &[&str] = &["important", "inherit", "initial", "none", "auto", "unset"];

const TOML_KEYWORDS: &[&str] = &["true", "false"];

const YAML_KEYWORDS: &[&str] = &["true", "false", "null", "yes", "no", "on", "off"];

static RUST: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(RUST_KEYWORDS)
        .rule(Comment, LINE_COMMENT)
        .rule(Comment, BLOCK_COMMENT)
        .rule(String, r##"b?r#"[\s\S]*?(?:"#|$)|b?r"[^"]*"?"##)
        .rule(String, r#"b?"(?:[^"\\]|\\.)*"?"#)
        .rule(String, r"b?'(?:[^'\\\n]|\\[^\n]+?)'")
        .rule(Attr, r"'[A-Za-z_]\w*")
        .rule(Attr, r"#!?\[[^\]\n]*\]")
        .followed(r"[A-Za-z_]\w*!", &['(', '[', '{'], Function, None)
        .rule(Number, &format!(r"(?:{C_NUMBER})(?:[iuf](?:8|16|32|64|128|size))?"))
        .identifier(r"[A-Za-z_]\w*")
        .rule(Punctuation, C_PUNCTUATION)
});

fn script_grammar(keywords: &'static [&'static str], jsx: bool) -> Grammar {
    let grammar = Grammar::new(keywords)
        .rule(Comment, LINE_COMMENT)
        .rule(Comment, BLOCK_COMMENT)
        .rule(String, r"`(?:[^`\\]|\\[\s\S])*`?")
        .rule(String, DQ_STRING)
        .rule(String, SQ_STRING);
    let grammar = if jsx {
        grammar.rule(Tag, r"</?[A-Za-z][\w.]*|/>")
    } else {
        grammar
    };
    grammar
        .rule(Number, &format!(r"(?:{C_NUMBER})n?"))
        .identifier(r"[A-Za-z_$][\w$]*")
        .rule(Punctuation, C_PUNCTUATION)
}

static JAVASCRIPT: LazyLock<Grammar> = LazyLock::new(|| script_grammar(JS_KEYWORDS, false));
static JSX: LazyLock<Grammar> = LazyLock::new(|| script_grammar(JS_KEYWORDS, true));
static TYPESCRIPT: LazyLock<Grammar> = LazyLock::new(|| script_grammar(TS_KEYWORDS, false));
static TSX: LazyLock<Grammar> = LazyLock::new(|| script_grammar(TS_KEYWORDS, true));

static PYTHON: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(PYTHON_KEYWORDS)
        .rule(Comment, HASH_COMMENT)
        .rule(String, r#"[rRbBuUfF]{0,2}"""[\s\S]*?(?:"""|$)"#)
        .rule(String, r"[rRbBuUfF]{0,2}'''[\s\S]*?(?:'''|$)")
        .rule(String, &format!("[rRbBuUfF]{{0,2}}(?:{DQ_STRING}|{SQ_STRING})"))
        .rule(Attr, r"@[A-Za-z_][\w.]*")
        .rule(Number, r"0[xX][0-9a-fA-F_]+|\d[\d_]*(?:\.\d[\d_]*)?(?:[eE][+-]?\d+)?j?")
        .identifier(r"[A-Za-z_]\w*")
        .rule(Punctuation, r"[{}()\[\];,.:<>=+\-*/%&|^!~@]")
});

static SHELL: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(SHELL_KEYWORDS)
        .rule(String, r#""(?:[^"\\]|\\[\s\S])*"?"#)
        .rule(String, r"'[^']*'?")
        .rule(Attr, r"\$\{[^}\n]*\}?|\$[A-Za-z_]\w*|\$[0-9@#?$!*-]")
        .rule(Comment, HASH_COMMENT)
        .rule(Number, r"\d+")
        .identifier(r"[A-Za-z_][\w.-]*")
        .rule(Punctuation, r"[|&;()<>{}\[\]=!]")
});

static JSON: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(JSON_KEYWORDS)
        .rule(Comment, LINE_COMMENT)
        .rule(Comment, BLOCK_COMMENT)
        .followed(DQ_STRING, &[':'], Attr, Some(String))
        .rule(Number, r"-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?")
        .identifier(r"[A-Za-z]+")
        .rule(Punctuation, r"[{}\[\],:]")
});

static CSS: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(CSS_KEYWORDS)
        .rule(Comment, BLOCK_COMMENT)
        .rule(String, DQ_STRING)
        .rule(String, SQ_STRING)
        .rule(Keyword, r"@[\w-]+")
        .rule(Number, r"#[0-9a-fA-F]{3,8}\b")
        .rule(Tag, r"[.#][A-Za-z_-][\w-]*")
        .rule(Number, r"-?(?:\d+\.?\d*|\.\d+)(?:%|[a-zA-Z]+)?")
        .followed(r"-?[A-Za-z_][\w-]*", &[':'], Attr, None)
        .identifier(r"-?[A-Za-z_][\w-]*")
        .rule(Punctuation, r"[{}();:,>+~*=\[\]!]")
});

static HTML: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(&[])
        .rule(Comment, r"<!--[\s\S]*?(?:-->|$)")
        .rule(Keyword, r"<![A-Za-z][^>]*>?")
        .rule(Tag, r"</?[A-Za-z][\w:-]*|/?>")
        .followed(r"[A-Za-z_:@][\w:.-]*", &['='], Attr, None)
        .rule(String, r#""[^"\n]*""#)
        .rule(String, r"'[^'\n]*'")
        .rule(Keyword, r"&#?\w+;")
        .rule(Punctuation, "=")
});

static TOML: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(TOML_KEYWORDS)
        .rule(Comment, HASH_COMMENT)
        .line_rule(Tag, r"\[\[?[^\]\n]*\]\]?")
        .rule(String, r#""""[\s\S]*?(?:"""|$)"#)
        .rule(String, r"'''[\s\S]*?(?:'''|$)")
        .rule(String, DQ_STRING)
        .rule(String, r"'[^'\n]*'?")
        .followed(r"[A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*", &['='], Attr, None)
        .rule(
            Number,
            r"\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:\d{2})?)?",
        )
        .rule(
            Number,
            r"[+-]?(?:0[xob][0-9a-fA-F_]+|\d[\d_]*(?:\.\d[\d_]*)?(?:[eE][+-]?\d+)?|inf|nan)",
        )
        .identifier(r"[A-Za-z_]\w*")
        .rule(Punctuation, r"[\[\]{},=.]")
});

static YAML: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::new(YAML_KEYWORDS)
        .rule(Comment, HASH_COMMENT)
        .line_rule(Punctuation, r"---|\.\.\.")
        .followed(DQ_STRING, &[':'], Attr, Some(String))
        .followed(SQ_STRING, &[':'], Attr, Some(String))
        .followed(r"[A-Za-z_][\w.-]*", &[':'], Attr, None)
        .rule(Tag, r"[&*][A-Za-z_][\w-]*|![\w!/.-]*")
        .rule(Number, r"[+-]?(?:\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|\.inf|\.nan)")
        .identifier(r"[A-Za-z_][\w.-]*")
        .rule(Punctuation, r"[-:\[\]{},|>?]")
});
