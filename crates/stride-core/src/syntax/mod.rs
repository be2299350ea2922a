//! Syntax layer: language detection, tree-sitter parsing and token roles.
//!
//! The matcher never compares raw text alone. Every token is classified into
//! a [`Role`] so an identifier and a string literal spelled the same way are
//! told apart.

mod parser;

use crate::edit::Span;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::{Node, Tree};

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Go,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "py" | "pyi" => Language::Python,
            "go" => Language::Go,
            _ => Language::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Accepts editor filetype names as well as extensions.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "rust" => Language::Rust,
            "javascript" | "javascriptreact" => Language::JavaScript,
            "typescript" => Language::TypeScript,
            "typescriptreact" => Language::Tsx,
            "python" => Language::Python,
            "go" | "golang" => Language::Go,
            other => Self::from_extension(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Python => "python",
            Language::Go => "go",
            Language::Unknown => "unknown",
        }
    }

    pub fn has_grammar(&self) -> bool {
        *self != Language::Unknown
    }
}

/// Syntactic role of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Variable, function, parameter or binding name
    Identifier,
    /// Member, field or object key name
    Property,
    /// Type name
    Type,
    /// Text inside a string literal
    StringText,
    Comment,
    Number,
    /// Text between markup tags (JSX)
    Markup,
    /// Plain-text word, used when no grammar is available
    Word,
    Other,
}

impl Role {
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "statement_identifier"
            | "package_identifier" => Role::Identifier,
            "property_identifier" | "field_identifier" | "private_property_identifier" => {
                Role::Property
            }
            "type_identifier" | "predefined_type" | "primitive_type" => Role::Type,
            "string_fragment"
            | "string_content"
            | "interpreted_string_literal_content"
            | "raw_string_literal_content" => Role::StringText,
            "comment" | "line_comment" | "block_comment" => Role::Comment,
            "number" | "integer" | "float" | "integer_literal" | "float_literal"
            | "int_literal" => Role::Number,
            "jsx_text" => Role::Markup,
            _ => Role::Other,
        }
    }

    /// Roles whose tokens are matched as whole nodes.
    pub fn is_symbol(&self) -> bool {
        matches!(self, Role::Identifier | Role::Property | Role::Type)
    }

    /// Roles whose tokens are free text searched for word-bounded occurrences.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Role::StringText | Role::Comment | Role::Markup | Role::Word
        )
    }
}

/// Role of a node. Anonymous leaves inherit the role of a named parent that
/// spans exactly the same bytes (`predefined_type` wraps the `string` keyword).
pub fn role_of_node(node: Node<'_>) -> Role {
    if node.is_named() {
        return Role::from_kind(node.kind());
    }
    match node.parent() {
        Some(parent) if parent.is_named() && parent.byte_range() == node.byte_range() => {
            Role::from_kind(parent.kind())
        }
        _ => Role::Other,
    }
}

/// A classified named node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    pub kind: &'static str,
    pub role: Role,
}

/// A parsed document.
pub struct SyntaxTree {
    tree: Tree,
    language: Language,
}

impl SyntaxTree {
    pub fn parse(text: &str, language: Language) -> Result<Self> {
        let tree = parser::parse_with_pooled_parser(text, language)?;
        Ok(Self { tree, language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Smallest node (named or not) covering `span`.
    pub fn node_covering(&self, span: Span) -> Option<Node<'_>> {
        self.root().descendant_for_byte_range(span.start, span.end)
    }

    /// Outermost named node spanning exactly `span`, if any.
    pub fn named_node_exact(&self, span: Span) -> Option<Node<'_>> {
        let mut node = self
            .root()
            .named_descendant_for_byte_range(span.start, span.end)?;
        if node.start_byte() != span.start || node.end_byte() != span.end {
            return None;
        }
        while let Some(parent) = node.parent() {
            if parent.byte_range() != node.byte_range() || parent.parent().is_none() {
                break;
            }
            node = parent;
        }
        Some(node)
    }

    pub fn role_at(&self, span: Span) -> Role {
        self.node_covering(span)
            .map(role_of_node)
            .unwrap_or(Role::Other)
    }

    /// Every named node with a role other than [`Role::Other`], in document order.
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        walk_named(self.root(), |node| {
            let role = Role::from_kind(node.kind());
            if role != Role::Other {
                tokens.push(Token {
                    span: span_of(&node),
                    kind: node.kind(),
                    role,
                });
            }
        });
        tokens
    }

    /// Every named node of `kind`, in document order.
    pub fn nodes_of_kind(&self, kind: &str) -> Vec<Node<'_>> {
        let mut nodes = Vec::new();
        walk_named(self.root(), |node| {
            if node.kind() == kind {
                nodes.push(node);
            }
        });
        nodes
    }
}

pub fn span_of(node: &Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

pub(crate) fn is_comment_kind(kind: &str) -> bool {
    Role::from_kind(kind) == Role::Comment
}

/// Pre-order walk over named nodes.
fn walk_named<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_named() {
            visit(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}
