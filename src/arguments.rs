use std::collections::HashMap;

use serde::Serialize;

use crate::lexer::Lexer;

/// Trimmed byte range `[start, end)` of one top-level call argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArgumentRange {
    pub start: usize,
    pub end: usize,
}

impl ArgumentRange {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    pub args: Vec<ArgumentRange>,
    /// Offset of the matching `)`, or `None` when input ended first.
    pub close_paren: Option<usize>,
    /// First code `{` inside the argument list, at any depth.
    pub first_brace: Option<usize>,
}

impl ParsedArguments {
    pub fn get(&self, index: usize) -> Option<&ArgumentRange> {
        self.args.get(index)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// One open `(`, `{` or `[` on the nesting stack.
struct Frame {
    opener: u8,
    open: usize,
    /// Template nesting at the opener; separators only count at the same depth.
    template_depth: usize,
    arg_start: usize,
    args: Vec<ArgumentRange>,
    first_brace: Option<usize>,
}

impl Frame {
    fn new(opener: u8, open: usize, template_depth: usize) -> Self {
        Self {
            opener,
            open,
            template_depth,
            arg_start: open + 1,
            args: Vec::new(),
            first_brace: None,
        }
    }

    fn finish(mut self, bytes: &[u8], end: usize, close_paren: Option<usize>) -> FinishedCall {
        push_trimmed(&mut self.args, bytes, self.arg_start, end);
        FinishedCall {
            open_paren: self.open,
            parsed: ParsedArguments {
                args: self.args,
                close_paren,
                first_brace: self.first_brace,
            },
        }
    }
}

struct FinishedCall {
    open_paren: usize,
    parsed: ParsedArguments,
}

/// Paren, brace and bracket nesting over code bytes only.
///
/// A `)` always closes the innermost open call opened at the same template
/// depth, so stray braces or brackets never keep a call open. A mismatched
/// `}` or `]` is ignored.
#[derive(Default)]
struct NestingStack {
    frames: Vec<Frame>,
    /// Indices into `frames` of the open calls.
    calls: Vec<usize>,
}

impl NestingStack {
    fn push(&mut self, frame: Frame) {
        if frame.opener == b'(' {
            self.calls.push(self.frames.len());
        }
        self.frames.push(frame);
    }

    fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn code_byte(
        &mut self,
        bytes: &[u8],
        index: usize,
        template_depth: usize,
        finished: &mut Vec<FinishedCall>,
    ) {
        self.discard_closed_expressions(bytes, index, template_depth, finished);

        match bytes[index] {
            b'(' | b'[' => self.push(Frame::new(bytes[index], index, template_depth)),
            b'{' => {
                // Once a frame has seen a brace every frame below it has too.
                for frame in self.frames.iter_mut().rev() {
                    if frame.first_brace.is_some() {
                        break;
                    }
                    frame.first_brace = Some(index);
                }
                self.push(Frame::new(b'{', index, template_depth));
            }
            b')' => {
                if let Some(&position) = self.calls.last()
                    && self.frames[position].template_depth == template_depth
                {
                    self.close_call(position, bytes, index, Some(index), finished);
                }
            }
            closer @ (b'}' | b']') => {
                let opener = if closer == b'}' { b'{' } else { b'[' };
                if self.frames.last().is_some_and(|frame| frame.opener == opener) {
                    self.frames.pop();
                }
            }
            b',' => {
                if let Some(frame) = self.frames.last_mut()
                    && frame.opener == b'('
                    && frame.template_depth == template_depth
                {
                    push_trimmed(&mut frame.args, bytes, frame.arg_start, index);
                    frame.arg_start = index + 1;
                }
            }
            _ => {}
        }
    }

    /// Frames opened inside a `${...}` that has since closed can never be
    /// balanced; their calls end without a close paren.
    fn discard_closed_expressions(
        &mut self,
        bytes: &[u8],
        index: usize,
        template_depth: usize,
        finished: &mut Vec<FinishedCall>,
    ) {
        while self
            .frames
            .last()
            .is_some_and(|frame| frame.template_depth > template_depth)
        {
            match self.calls.last() {
                Some(&position) if self.frames[position].template_depth > template_depth => {
                    self.close_call(position, bytes, index, None, finished);
                }
                _ => {
                    self.frames.pop();
                }
            }
        }
    }

    /// Ends the call at `position` and every call opened inside it.
    fn close_call(
        &mut self,
        position: usize,
        bytes: &[u8],
        end: usize,
        close_paren: Option<usize>,
        finished: &mut Vec<FinishedCall>,
    ) {
        for inner in self.frames.split_off(position + 1).into_iter().rev() {
            if inner.opener == b'(' {
                self.calls.pop();
                finished.push(inner.finish(bytes, end, None));
            }
        }
        self.calls.pop();
        if let Some(call) = self.frames.pop() {
            finished.push(call.finish(bytes, end, close_paren));
        }
    }

    /// Calls still open at end of input keep their trailing argument.
    fn finish_open_calls(self, bytes: &[u8], finished: &mut Vec<FinishedCall>) {
        for frame in self.frames.into_iter().rev() {
            if frame.opener == b'(' {
                finished.push(frame.finish(bytes, bytes.len(), None));
            }
        }
    }
}

/// Splits the argument list of the call whose `(` sits at `open_paren`.
///
/// Nesting is only counted on code bytes, so parens, braces and brackets in
/// strings, comments, regex literals and template text never shift argument
/// boundaries. Inside `${...}` expressions nesting is counted like any other
/// code, but a comma there never separates arguments of the enclosing call.
/// An unbalanced call yields whatever arguments precede end of input.
pub fn parse_arguments(original: &str, open_paren: usize) -> ParsedArguments {
    if original.as_bytes().get(open_paren) != Some(&b'(') {
        return ParsedArguments::default();
    }

    let bytes = original.as_bytes();
    let mut stack = NestingStack::default();
    stack.push(Frame::new(b'(', open_paren, 0));
    let mut finished = Vec::new();

    let mut lexer = Lexer::resume(original, open_paren + 1, Some(b'('));
    while let Some(segment) = lexer.next() {
        if !segment.is_code() {
            continue;
        }
        stack.code_byte(bytes, segment.start, lexer.template_depth(), &mut finished);
        if stack.is_empty() {
            break;
        }
    }
    stack.finish_open_calls(bytes, &mut finished);

    finished
        .into_iter()
        .find(|call| call.open_paren == open_paren)
        .map(|call| call.parsed)
        .unwrap_or_default()
}

/// Argument lists of every call in a file plus the matching `}` of every `{`,
/// collected in a single lexer pass.
///
/// Looking up many call sites this way stays linear in the file size even
/// when calls are left unbalanced.
#[derive(Debug, Clone, Default)]
pub struct CallIndex {
    calls: HashMap<usize, ParsedArguments>,
    brace_closes: HashMap<usize, usize>,
}

impl CallIndex {
    pub fn build(original: &str) -> Self {
        let bytes = original.as_bytes();
        let mut stack = NestingStack::default();
        let mut finished = Vec::new();
        let mut open_braces = Vec::new();
        let mut brace_closes = HashMap::new();

        let mut lexer = Lexer::new(original);
        while let Some(segment) = lexer.next() {
            if !segment.is_code() {
                continue;
            }
            let index = segment.start;
            match bytes[index] {
                b'{' => open_braces.push(index),
                b'}' => {
                    if let Some(open) = open_braces.pop() {
                        brace_closes.insert(open, index);
                    }
                }
                _ => {}
            }
            stack.code_byte(bytes, index, lexer.template_depth(), &mut finished);
        }
        stack.finish_open_calls(bytes, &mut finished);

        Self {
            calls: finished
                .into_iter()
                .map(|call| (call.open_paren, call.parsed))
                .collect(),
            brace_closes,
        }
    }

    /// Arguments of the call opening at `open_paren`, or `None` when no code
    /// `(` sits there.
    pub fn arguments(&self, open_paren: usize) -> Option<&ParsedArguments> {
        self.calls.get(&open_paren)
    }

    /// Offset of the `}` balancing the `{` at `open_brace`.
    pub fn brace_close(&self, open_brace: usize) -> Option<usize> {
        self.brace_closes.get(&open_brace).copied()
    }
}

fn push_trimmed(args: &mut Vec<ArgumentRange>, bytes: &[u8], mut start: usize, mut end: usize) {
    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    if start < end {
        args.push(ArgumentRange { start, end });
    }
}
