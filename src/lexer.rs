//! Single-pass region classification for JavaScript/TypeScript source.
//!
//! The lexer walks the source byte by byte and splits it into code and
//! non-code segments (strings, comments, regex literals and template text).
//! All structurally significant characters are ASCII, so classification works
//! on bytes and never splits a multi-byte character across regions.
//!
//! The same [`Lexer`] drives both the whole-file projection ([`classify`]) and
//! the call-argument parser, which resumes it from the middle of a file. The
//! only rolling context is the last significant code byte and the stack of
//! open template literals, both owned by the lexer value itself.

/// Classification mode of the scanner at the current offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerState {
    Code,
    LineComment,
    BlockComment,
    SingleQuoted { escaped: bool },
    DoubleQuoted { escaped: bool },
    /// Literal text of the innermost open template.
    Template,
    Regex { escaped: bool, in_class: bool },
}

/// One nesting level of an open template literal.
///
/// `expr_brace_depth == 0` means the scanner is in the template's literal
/// text; a positive depth means it is inside one of its `${...}` expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateFrame {
    pub expr_brace_depth: usize,
    pub escape_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Code,
    NonCode,
}

/// A run of bytes `[start, end)` that shares one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub region: Region,
}

impl Segment {
    pub fn is_code(&self) -> bool {
        self.region == Region::Code
    }
}

/// Iterator over the [`Segment`]s of a source text.
///
/// Every call to `next` consumes at least one byte, and end of input ends the
/// iteration in any state, so iteration always terminates. Open templates left
/// on the stack at end of input are simply dropped with the lexer.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a [u8],
    index: usize,
    state: LexerState,
    templates: Vec<TemplateFrame>,
    last_significant: Option<u8>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::resume(source, 0, None)
    }

    /// Starts lexing in the code state at `start`, as if `last_significant`
    /// was the last non-whitespace code byte seen before it.
    pub fn resume(source: &'a str, start: usize, last_significant: Option<u8>) -> Self {
        Self {
            source: source.as_bytes(),
            index: start.min(source.len()),
            state: LexerState::Code,
            templates: Vec::new(),
            last_significant,
        }
    }

    pub fn state(&self) -> LexerState {
        self.state
    }

    pub fn offset(&self) -> usize {
        self.index
    }

    pub fn template_depth(&self) -> usize {
        self.templates.len()
    }

    pub fn last_significant(&self) -> Option<u8> {
        self.last_significant
    }

    fn step(&mut self) -> Option<Segment> {
        let start = self.index;
        let byte = *self.source.get(start)?;
        let next = self.source.get(start + 1).copied();

        let (len, region) = match self.state {
            LexerState::Code => self.step_code(byte, next),
            LexerState::LineComment => self.step_line_comment(byte),
            LexerState::BlockComment => self.step_block_comment(byte, next),
            LexerState::SingleQuoted { escaped } => self.step_quoted(byte, b'\'', escaped),
            LexerState::DoubleQuoted { escaped } => self.step_quoted(byte, b'"', escaped),
            LexerState::Template => self.step_template(byte, next),
            LexerState::Regex { escaped, in_class } => {
                self.step_regex(start, byte, escaped, in_class)
            }
        };

        let end = (start + len.max(1)).min(self.source.len());
        self.index = end;
        Some(Segment { start, end, region })
    }

    fn step_code(&mut self, byte: u8, next: Option<u8>) -> (usize, Region) {
        match (byte, next) {
            (b'/', Some(b'/')) => {
                self.state = LexerState::LineComment;
                (2, Region::NonCode)
            }
            (b'/', Some(b'*')) => {
                self.state = LexerState::BlockComment;
                (2, Region::NonCode)
            }
            (b'\'', _) => {
                self.state = LexerState::SingleQuoted { escaped: false };
                (1, Region::NonCode)
            }
            (b'"', _) => {
                self.state = LexerState::DoubleQuoted { escaped: false };
                (1, Region::NonCode)
            }
            (b'`', _) => {
                self.templates.push(TemplateFrame::default());
                self.state = LexerState::Template;
                (1, Region::NonCode)
            }
            (b'/', _) if is_regex_start(self.last_significant) => {
                self.state = LexerState::Regex {
                    escaped: false,
                    in_class: false,
                };
                (1, Region::NonCode)
            }
            (b'{' | b'}', _) if !self.templates.is_empty() => self.step_expression_brace(byte),
            _ => {
                if !byte.is_ascii_whitespace() {
                    self.last_significant = Some(byte);
                }
                (1, Region::Code)
            }
        }
    }

    // Braces inside a `${...}` expression. The `}` that closes the expression
    // belongs to the template syntax and is blanked like its `${`.
    fn step_expression_brace(&mut self, byte: u8) -> (usize, Region) {
        let Some(frame) = self.templates.last_mut() else {
            self.last_significant = Some(byte);
            return (1, Region::Code);
        };

        if byte == b'{' {
            frame.expr_brace_depth += 1;
            self.last_significant = Some(byte);
            return (1, Region::Code);
        }

        frame.expr_brace_depth = frame.expr_brace_depth.saturating_sub(1);
        let closes_expression = frame.expr_brace_depth == 0;
        self.last_significant = Some(byte);
        if closes_expression {
            self.state = LexerState::Template;
            (1, Region::NonCode)
        } else {
            (1, Region::Code)
        }
    }

    fn step_line_comment(&mut self, byte: u8) -> (usize, Region) {
        if byte == b'\n' {
            self.state = LexerState::Code;
            return (1, Region::Code);
        }
        (1, Region::NonCode)
    }

    fn step_block_comment(&mut self, byte: u8, next: Option<u8>) -> (usize, Region) {
        if byte == b'*' && next == Some(b'/') {
            self.state = LexerState::Code;
            return (2, Region::NonCode);
        }
        (1, Region::NonCode)
    }

    // Newlines do not end a quoted string; a malformed multi-line literal runs
    // on until its closing quote or end of input.
    fn step_quoted(&mut self, byte: u8, quote: u8, escaped: bool) -> (usize, Region) {
        if !escaped && byte == quote {
            self.state = LexerState::Code;
            self.last_significant = Some(quote);
            return (1, Region::NonCode);
        }

        let escaped = !escaped && byte == b'\\';
        self.state = if quote == b'\'' {
            LexerState::SingleQuoted { escaped }
        } else {
            LexerState::DoubleQuoted { escaped }
        };
        (1, Region::NonCode)
    }

    fn step_template(&mut self, byte: u8, next: Option<u8>) -> (usize, Region) {
        let Some(frame) = self.templates.last_mut() else {
            self.state = LexerState::Code;
            return self.step_code(byte, next);
        };

        if frame.escape_pending {
            frame.escape_pending = false;
            return (1, Region::NonCode);
        }

        match (byte, next) {
            (b'\\', _) => {
                frame.escape_pending = true;
                (1, Region::NonCode)
            }
            (b'`', _) => {
                self.templates.pop();
                self.state = LexerState::Code;
                self.last_significant = Some(b'`');
                (1, Region::NonCode)
            }
            (b'$', Some(b'{')) => {
                frame.expr_brace_depth = 1;
                self.state = LexerState::Code;
                self.last_significant = Some(b'{');
                (2, Region::NonCode)
            }
            _ => (1, Region::NonCode),
        }
    }

    fn step_regex(
        &mut self,
        start: usize,
        byte: u8,
        escaped: bool,
        in_class: bool,
    ) -> (usize, Region) {
        if escaped {
            self.state = LexerState::Regex {
                escaped: false,
                in_class,
            };
            return (1, Region::NonCode);
        }

        match byte {
            b'\\' => {
                self.state = LexerState::Regex {
                    escaped: true,
                    in_class,
                };
            }
            b'[' => {
                self.state = LexerState::Regex {
                    escaped: false,
                    in_class: true,
                };
            }
            b']' => {
                self.state = LexerState::Regex {
                    escaped: false,
                    in_class: false,
                };
            }
            b'/' if !in_class => {
                let flags = self.source[start + 1..]
                    .iter()
                    .take_while(|flag| flag.is_ascii_alphabetic())
                    .count();
                self.state = LexerState::Code;
                self.last_significant = Some(b'/');
                return (1 + flags, Region::NonCode);
            }
            _ => {}
        }

        (1, Region::NonCode)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

/// Decides whether a `/` starts a regex literal given the last significant
/// code byte before it (`None` at the start of a scan).
pub fn is_regex_start(previous: Option<u8>) -> bool {
    match previous {
        None => true,
        Some(byte) => matches!(
            byte,
            b'(' | b'['
                | b'{'
                | b','
                | b';'
                | b':'
                | b'='
                | b'!'
                | b'&'
                | b'|'
                | b'?'
                | b'+'
                | b'-'
                | b'*'
                | b'%'
                | b'<'
                | b'>'
                | b'~'
                | b'^'
        ),
    }
}

/// Source text with every non-code byte replaced by a space.
///
/// Line terminators are kept in place, so byte offsets and line numbers in the
/// projection match the original exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionProjection {
    text: String,
}

impl RegionProjection {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        let text = String::from_utf8(bytes).unwrap_or_else(|error| {
            error
                .into_bytes()
                .into_iter()
                .map(|byte| if byte.is_ascii() { byte as char } else { ' ' })
                .collect()
        });
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl AsRef<str> for RegionProjection {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

pub fn classify(source: &str) -> RegionProjection {
    let bytes = source.as_bytes();
    let mut projected = Vec::with_capacity(bytes.len());

    for segment in Lexer::new(source) {
        let run = &bytes[segment.start..segment.end];
        match segment.region {
            Region::Code => projected.extend_from_slice(run),
            Region::NonCode => projected.extend(run.iter().map(|&byte| blank(byte))),
        }
    }

    RegionProjection::from_bytes(projected)
}

fn blank(byte: u8) -> u8 {
    if matches!(byte, b'\n' | b'\r') {
        byte
    } else {
        b' '
    }
}

/// A string or template literal, delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralSpan {
    pub start: usize,
    pub end: usize,
    pub delimiter: u8,
}

impl LiteralSpan {
    pub fn is_empty_literal(&self) -> bool {
        self.end - self.start == 2
    }
}

/// Collects every string and template literal in `source` in closing order.
/// Unterminated literals are not reported.
pub fn literal_spans(source: &str) -> Vec<LiteralSpan> {
    let mut lexer = Lexer::new(source);
    let mut spans = Vec::new();
    let mut open_quote: Option<(usize, u8)> = None;
    let mut template_starts = Vec::new();

    loop {
        let state_before = lexer.state();
        let depth_before = lexer.template_depth();
        let Some(segment) = lexer.next() else {
            break;
        };
        let state_after = lexer.state();
        let depth_after = lexer.template_depth();

        match (state_before, state_after) {
            (LexerState::Code, LexerState::SingleQuoted { .. }) => {
                open_quote = Some((segment.start, b'\''));
            }
            (LexerState::Code, LexerState::DoubleQuoted { .. }) => {
                open_quote = Some((segment.start, b'"'));
            }
            (
                LexerState::SingleQuoted { .. } | LexerState::DoubleQuoted { .. },
                LexerState::Code,
            ) => {
                if let Some((start, delimiter)) = open_quote.take() {
                    spans.push(LiteralSpan {
                        start,
                        end: segment.end,
                        delimiter,
                    });
                }
            }
            _ => {}
        }

        if depth_after > depth_before {
            template_starts.push(segment.start);
        } else if depth_after < depth_before
            && let Some(start) = template_starts.pop()
        {
            spans.push(LiteralSpan {
                start,
                end: segment.end,
                delimiter: b'`',
            });
        }
    }

    spans
}
