//! Format-preserving SSH client configuration document
//!
//! [`ConfigDocument::parse`] turns the text of an `ssh_config` file into an
//! ordered list of [`Block`]s. The lines before the first `Host`/`Match`
//! keyword form a headerless global block. Every line keeps its original
//! layout, so [`ConfigDocument::render`] reproduces the input byte for byte
//! until a block is modified. Only the lines touched by a mutation are
//! re-rendered.
//!
//! Directives the repository does not understand (`ProxyJump`, `Include`,
//! `LocalForward`, ...) are carried along untouched.

mod parser;

use std::fmt;

use thiserror::Error;

use parser::{KeywordLine, Lexed, RawLine};

/// Indentation used for directives inserted by the repository
pub const DIRECTIVE_INDENT: &str = "    ";

/// Error produced when config text cannot be parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number (0 when the whole input is rejected)
    pub line: usize,
    /// Human-readable reason
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Returns the canonical casing for the keys the repository writes
#[must_use]
pub fn canonical_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "host" => "Host".to_string(),
        "hostname" => "HostName".to_string(),
        "user" => "User".to_string(),
        "port" => "Port".to_string(),
        "identityfile" => "IdentityFile".to_string(),
        _ => key.to_string(),
    }
}

/// Kind of block a header introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Lines before the first `Host` or `Match` keyword
    Global,
    /// `Host pattern...`
    Host,
    /// `Match criteria...`
    Match,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    line: RawLine,
    layout: KeywordLine,
    kind: BlockKind,
    patterns: Vec<String>,
}

impl Header {
    fn rebuild(&mut self) {
        let value = self
            .patterns
            .iter()
            .map(|p| parser::quote(p))
            .collect::<Vec<_>>()
            .join(" ");
        self.layout.value = value;
        self.render_line();
    }

    /// Replaces the pattern at `index`, keeping the spacing between tokens
    fn replace_pattern(&mut self, index: usize, new: &str) {
        self.patterns[index] = new.to_string();
        let spans = parser::token_spans(&self.layout.value);
        match spans.get(index) {
            Some(span) if spans.len() == self.patterns.len() => {
                self.layout
                    .value
                    .replace_range(span.clone(), &parser::quote(new));
                self.render_line();
            }
            _ => self.rebuild(),
        }
    }

    fn render_line(&mut self) {
        self.line.text = format!(
            "{}{}{}{}{}",
            self.layout.indent,
            self.layout.key,
            self.layout.separator,
            self.layout.value,
            self.layout.trailing
        );
    }
}

/// A `Key value` line inside a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    line: RawLine,
    layout: KeywordLine,
}

impl Directive {
    fn new(key: &str, value: &str, eol: &'static str) -> Self {
        let layout = KeywordLine {
            indent: DIRECTIVE_INDENT.to_string(),
            key: canonical_key(key),
            separator: " ".to_string(),
            value: parser::quote(value),
            trailing: String::new(),
        };
        let text = format!("{}{}{}{}", layout.indent, layout.key, layout.separator, layout.value);
        Self {
            line: RawLine { text, eol },
            layout,
        }
    }

    /// Key as written in the file
    #[must_use]
    pub fn key(&self) -> &str {
        &self.layout.key
    }

    /// Value with surrounding quotes removed
    #[must_use]
    pub fn value(&self) -> &str {
        parser::unquote(&self.layout.value)
    }

    /// Returns true if the key matches `key` case-insensitively
    #[must_use]
    pub fn is(&self, key: &str) -> bool {
        self.layout.key.eq_ignore_ascii_case(key)
    }

    fn set_value(&mut self, value: &str) {
        self.layout.value = parser::quote(value);
        self.line.text = format!(
            "{}{}{}{}{}",
            self.layout.indent,
            self.layout.key,
            self.layout.separator,
            self.layout.value,
            self.layout.trailing
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Directive(Directive),
    Trivia(RawLine),
}

impl Node {
    const fn line(&self) -> &RawLine {
        match self {
            Self::Directive(d) => &d.line,
            Self::Trivia(line) => line,
        }
    }

    const fn line_mut(&mut self) -> &mut RawLine {
        match self {
            Self::Directive(d) => &mut d.line,
            Self::Trivia(line) => line,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Trivia(line) if line.text.trim().is_empty())
    }
}

/// A header line and the lines that follow it up to the next header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    header: Option<Header>,
    nodes: Vec<Node>,
}

impl Block {
    /// Creates a new `Host` block with a single pattern
    #[must_use]
    pub fn host(pattern: &str) -> Self {
        let mut header = Header {
            line: RawLine {
                text: String::new(),
                eol: "\n",
            },
            layout: KeywordLine {
                indent: String::new(),
                key: "Host".to_string(),
                separator: " ".to_string(),
                value: String::new(),
                trailing: String::new(),
            },
            kind: BlockKind::Host,
            patterns: vec![pattern.to_string()],
        };
        header.rebuild();
        Self {
            header: Some(header),
            nodes: Vec::new(),
        }
    }

    /// Kind of this block
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.header.as_ref().map_or(BlockKind::Global, |h| h.kind)
    }

    /// Patterns of the header (`Match` criteria for `Match` blocks)
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        self.header
            .as_ref()
            .map(|h| h.patterns.as_slice())
            .unwrap_or_default()
    }

    /// Returns true if this is a `Host` block listing `identity` verbatim
    #[must_use]
    pub fn has_pattern(&self, identity: &str) -> bool {
        self.kind() == BlockKind::Host && self.patterns().iter().any(|p| p == identity)
    }

    /// Iterates over the directives of the block in file order
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Directive(d) => Some(d),
            Node::Trivia(_) => None,
        })
    }

    /// First value for `key` (matched case-insensitively)
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.directives().find(|d| d.is(key)).map(Directive::value)
    }

    /// All values for `key` in file order
    #[must_use]
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.directives()
            .filter(|d| d.is(key))
            .map(Directive::value)
            .collect()
    }

    /// Replaces the header pattern `old` with `new`
    ///
    /// Returns false if `old` is not one of the block's patterns.
    pub fn rename_pattern(&mut self, old: &str, new: &str) -> bool {
        let Some(header) = self.header.as_mut() else {
            return false;
        };
        let Some(index) = header.patterns.iter().position(|p| p == old) else {
            return false;
        };
        header.replace_pattern(index, new);
        true
    }

    /// Sets `key` to `value`, updating the first matching directive in place
    /// or appending a new one
    ///
    /// Returns true if the block changed.
    pub fn upsert_directive(&mut self, key: &str, value: &str) -> bool {
        let existing = self.nodes.iter_mut().find_map(|node| match node {
            Node::Directive(d) if d.is(key) => Some(d),
            _ => None,
        });
        match existing {
            Some(directive) if directive.value() == value => false,
            Some(directive) => {
                directive.set_value(value);
                true
            }
            None => {
                self.insert_directive(key, value);
                true
            }
        }
    }

    /// Removes every directive named `key` and writes `values` in order
    ///
    /// The new directives take the place of the first removed one, or go
    /// after the last directive if the block had none. A family that already
    /// holds exactly `values` is left untouched. Returns true if the block
    /// changed.
    pub fn replace_directive_family(&mut self, key: &str, values: &[String]) -> bool {
        let current = self.values(key);
        if current.len() == values.len() && current.iter().zip(values).all(|(a, b)| *a == b) {
            return false;
        }

        let first = self
            .nodes
            .iter()
            .position(|node| matches!(node, Node::Directive(d) if d.is(key)));
        self.nodes
            .retain(|node| !matches!(node, Node::Directive(d) if d.is(key)));

        match first {
            Some(position) => {
                let eol = self.line_ending();
                for (offset, value) in values.iter().enumerate() {
                    self.nodes.insert(
                        position + offset,
                        Node::Directive(Directive::new(key, value, eol)),
                    );
                }
            }
            None => {
                for value in values {
                    self.insert_directive(key, value);
                }
            }
        }
        true
    }

    fn line_ending(&self) -> &'static str {
        self.header
            .iter()
            .map(|h| &h.line)
            .chain(self.nodes.iter().map(Node::line))
            .map(|line| line.eol)
            .find(|eol| !eol.is_empty())
            .unwrap_or("\n")
    }

    /// Inserts a directive after the last existing directive so that blank
    /// lines and comments trailing the block stay below it
    fn insert_directive(&mut self, key: &str, value: &str) {
        let eol = self.line_ending();
        let position = self
            .nodes
            .iter()
            .rposition(|node| matches!(node, Node::Directive(_)))
            .map_or(0, |i| i + 1);

        let previous = if position == 0 {
            self.header.as_mut().map(|h| &mut h.line)
        } else {
            Some(self.nodes[position - 1].line_mut())
        };
        if let Some(previous) = previous {
            if previous.eol.is_empty() {
                previous.eol = eol;
            }
        }

        self.nodes
            .insert(position, Node::Directive(Directive::new(key, value, eol)));
    }

    fn set_line_ending(&mut self, eol: &'static str) {
        if let Some(header) = self.header.as_mut() {
            header.line.eol = eol;
        }
        for node in &mut self.nodes {
            node.line_mut().eol = eol;
        }
    }

    fn last_line_mut(&mut self) -> Option<&mut RawLine> {
        match self.nodes.last_mut() {
            Some(node) => Some(node.line_mut()),
            None => self.header.as_mut().map(|h| &mut h.line),
        }
    }

    fn is_empty(&self) -> bool {
        self.header.is_none() && self.nodes.is_empty()
    }

    fn ends_with_blank(&self) -> bool {
        self.nodes.last().is_some_and(Node::is_blank)
    }

    fn write_to(&self, out: &mut String) {
        if let Some(header) = &self.header {
            out.push_str(&header.line.text);
            out.push_str(header.line.eol);
        }
        for node in &self.nodes {
            let line = node.line();
            out.push_str(&line.text);
            out.push_str(line.eol);
        }
    }
}

/// Parsed SSH config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    bom: bool,
    blocks: Vec<Block>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            bom: false,
            blocks: vec![Block {
                header: None,
                nodes: Vec::new(),
            }],
        }
    }
}

impl ConfigDocument {
    /// Parses config bytes
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not UTF-8, a quote is left open,
    /// a keyword has no value, or a `Host`/`Match` line has no patterns.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            let valid = &bytes[..e.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            ParseError::new(line, "invalid UTF-8")
        })?;
        Self::parse_str(text)
    }

    /// Parses config text
    ///
    /// # Errors
    ///
    /// See [`ConfigDocument::parse`].
    pub fn parse_str(text: &str) -> Result<Self, ParseError> {
        let (bom, text) = match text.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let mut blocks = vec![Block {
            header: None,
            nodes: Vec::new(),
        }];

        for (index, line) in parser::split_lines(text).into_iter().enumerate() {
            let line_no = index + 1;
            let layout = match parser::lex_line(&line.text, line_no)? {
                Lexed::Trivia => {
                    push_node(&mut blocks, Node::Trivia(line));
                    continue;
                }
                Lexed::Keyword(layout) => layout,
            };

            let kind = if layout.key.eq_ignore_ascii_case("host") {
                Some(BlockKind::Host)
            } else if layout.key.eq_ignore_ascii_case("match") {
                Some(BlockKind::Match)
            } else {
                None
            };

            match kind {
                Some(kind) => {
                    let patterns = parser::split_tokens(&layout.value)
                        .map_err(|reason| ParseError::new(line_no, reason))?;
                    if patterns.is_empty() {
                        return Err(ParseError::new(
                            line_no,
                            format!("'{}' without patterns", layout.key),
                        ));
                    }
                    blocks.push(Block {
                        header: Some(Header {
                            line,
                            layout,
                            kind,
                            patterns,
                        }),
                        nodes: Vec::new(),
                    });
                }
                None => push_node(&mut blocks, Node::Directive(Directive { line, layout })),
            }
        }

        Ok(Self { bom, blocks })
    }

    /// Renders the document back to text
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        for block in &self.blocks {
            block.write_to(&mut out);
        }
        out
    }

    /// Renders the document to bytes
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.render().into_bytes()
    }

    /// All blocks in document order, starting with the global block
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// `Host` blocks in document order
    pub fn host_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.kind() == BlockKind::Host)
    }

    /// First `Host` block listing `identity` among its patterns
    #[must_use]
    pub fn find_block(&self, identity: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.has_pattern(identity))
    }

    /// Mutable variant of [`ConfigDocument::find_block`]
    pub fn find_block_mut(&mut self, identity: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.has_pattern(identity))
    }

    /// Returns true if some `Host` block lists `identity`
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.find_block(identity).is_some()
    }

    /// Appends a block at the end of the document, separated from the
    /// previous content by a blank line
    pub fn append_block(&mut self, mut block: Block) {
        let eol = self.line_ending();

        if let Some(last) = self.blocks.iter_mut().rev().find(|b| !b.is_empty()) {
            let needs_separator = !last.ends_with_blank();
            if let Some(line) = last.last_line_mut() {
                if line.eol.is_empty() {
                    line.eol = eol;
                }
            }
            if needs_separator {
                last.nodes.push(Node::Trivia(RawLine {
                    text: String::new(),
                    eol,
                }));
            }
        }
        block.set_line_ending(eol);
        self.blocks.push(block);
    }

    /// Removes the first `Host` block listing `identity`
    pub fn remove_block(&mut self, identity: &str) -> Option<Block> {
        let index = self.blocks.iter().position(|b| b.has_pattern(identity))?;
        Some(self.blocks.remove(index))
    }

    /// Line terminator used by the document (`\r\n` if any line uses it)
    fn line_ending(&self) -> &'static str {
        let crlf = self.blocks.iter().any(|b| {
            b.header.iter().any(|h| h.line.eol == "\r\n")
                || b.nodes.iter().any(|n| n.line().eol == "\r\n")
        });
        if crlf { "\r\n" } else { "\n" }
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn push_node(blocks: &mut [Block], node: Node) {
    if let Some(block) = blocks.last_mut() {
        block.nodes.push(node);
    }
}
