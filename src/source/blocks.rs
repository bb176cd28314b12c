//! Extraction of configuration structs from generated parameter headers.
//!
//! The extractor is a line-oriented state machine. It does not parse C++; it
//! only locates `struct` declarations, captures the comment line directly
//! above each one as its label, and follows brace depth until the body closes.

use std::fmt;
use std::mem;
use std::ops::Range;

use super::{is_ident_char, Annotations, COMMENT};

const KEYWORD: &str = "struct";

/// Handling of structs whose braces never balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractMode {
    /// Keep the truncated block and continue.
    #[default]
    Lenient,
    /// Fail with [`UnterminatedBlock`].
    Strict,
}

/// A `struct` declaration found in the parameter source.
#[derive(Debug)]
pub struct ConfigBlock<'src> {
    /// Text of the comment line directly above the declaration.
    pub label: Option<&'src str>,
    /// Declared name of the struct.
    pub name: &'src str,
    /// Lines from the one holding the opening brace to the one holding the
    /// matching closing brace.
    pub body: Vec<&'src str>,
    /// Source text from the declaration keyword to the end of the body.
    pub raw: &'src str,
    /// Byte range of `raw` in the source.
    pub span: Range<usize>,
}

impl<'src> ConfigBlock<'src> {
    pub fn annotations(&self) -> Annotations<'src> {
        Annotations::new(self.body.iter().copied())
    }
}

/// A struct whose body runs past the end of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnterminatedBlock {
    pub name: String,
    /// Byte range of the line where the unclosed declaration begins.
    pub span: Range<usize>,
}

impl fmt::Display for UnterminatedBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "struct `{}` is never closed", self.name)
    }
}

/// Extracts the labelled configuration blocks of `text`. Unlabelled structs
/// are still parsed, so that their bodies are skipped correctly.
pub fn extract(
    text: &str,
    mode: ExtractMode,
) -> Result<Vec<ConfigBlock<'_>>, UnterminatedBlock> {
    let mut blocks = parse(text, mode)?;

    blocks.retain(|block| block.label.is_some());

    Ok(blocks)
}

/// Extracts every struct declaration of `text`, labelled or not.
pub fn parse(
    text: &str,
    mode: ExtractMode,
) -> Result<Vec<ConfigBlock<'_>>, UnterminatedBlock> {
    let mut extractor = Extractor {
        text,
        mode,
        state: State::Seeking,
        prev: None,
        blocks: Vec::new(),
    };

    for line in lines(text) {
        extractor.feed(line);
    }

    extractor.finish()
}

struct Line<'src> {
    text: &'src str,
    span: Range<usize>,
}

fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();

        let text = line.trim_end_matches(&['\n', '\r'][..]);

        Some(Line {
            text,
            span: start..start + text.len(),
        })
    })
}

struct Header<'src> {
    label: Option<&'src str>,
    name: &'src str,
    span: Range<usize>,
}

impl<'src> Header<'src> {
    fn parse(line: &Line<'src>, prev: Option<&'src str>) -> Option<Self> {
        let rest = line.text.trim_start().strip_prefix(KEYWORD)?;

        if rest.starts_with(is_ident_char) {
            return None;
        }

        let name = rest
            .trim_start()
            .split(|c: char| c.is_whitespace() || matches!(c, ':' | '{' | ';'))
            .next()
            .filter(|name| !name.is_empty())?;

        let label = prev
            .and_then(|prev| prev.trim().strip_prefix(COMMENT))
            .map(str::trim);

        Some(Header {
            label,
            name,
            span: line.span.clone(),
        })
    }
}

struct Body<'src> {
    header: Header<'src>,
    open: Range<usize>,
    depth: i64,
    lines: Vec<&'src str>,
}

impl<'src> Body<'src> {
    fn into_block(self, text: &'src str, end: usize) -> ConfigBlock<'src> {
        let span = self.header.span.start..end;

        ConfigBlock {
            label: self.header.label,
            name: self.header.name,
            body: self.lines,
            raw: &text[span.clone()],
            span,
        }
    }
}

enum State<'src> {
    Seeking,
    InHeader(Header<'src>),
    InBody(Body<'src>),
}

enum Opening {
    Brace,
    Declaration,
    Pending,
}

impl Opening {
    fn classify(line: &str) -> Opening {
        let brace = line.find('{');
        let semi = super::code(line).find(';');

        match (brace, semi) {
            (Some(brace), Some(semi)) if semi < brace => Opening::Declaration,
            (Some(_), _) => Opening::Brace,
            (None, Some(_)) => Opening::Declaration,
            (None, None) => Opening::Pending,
        }
    }
}

fn depth_change(line: &str) -> i64 {
    line.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

struct Extractor<'src> {
    text: &'src str,
    mode: ExtractMode,
    state: State<'src>,
    prev: Option<&'src str>,
    blocks: Vec<ConfigBlock<'src>>,
}

impl<'src> Extractor<'src> {
    fn feed(&mut self, line: Line<'src>) {
        let mut state = mem::replace(&mut self.state, State::Seeking);

        if let State::Seeking = state {
            if let Some(header) = Header::parse(&line, self.prev) {
                state = State::InHeader(header);
            }
        }

        if let State::InHeader(header) = state {
            state = match Opening::classify(line.text) {
                Opening::Brace => State::InBody(Body {
                    header,
                    open: line.span.clone(),
                    depth: 0,
                    lines: Vec::new(),
                }),
                Opening::Declaration => State::Seeking,
                Opening::Pending => State::InHeader(header),
            };
        }

        if let State::InBody(mut body) = state {
            body.depth += depth_change(line.text);
            body.lines.push(line.text);

            state = if body.depth <= 0 {
                log::debug!("Extracted struct `{}`", body.header.name);

                self.blocks.push(body.into_block(self.text, line.span.end));

                State::Seeking
            } else {
                State::InBody(body)
            };
        }

        self.state = state;
        self.prev = Some(line.text);
    }

    fn finish(mut self) -> Result<Vec<ConfigBlock<'src>>, UnterminatedBlock> {
        match mem::replace(&mut self.state, State::Seeking) {
            State::Seeking => {}
            State::InHeader(header) => {
                let err = UnterminatedBlock {
                    name: header.name.to_string(),
                    span: header.span,
                };

                if self.mode == ExtractMode::Strict {
                    return Err(err);
                }

                log::warn!("{err}; no opening brace found, ignoring it");
            }
            State::InBody(body) => {
                let err = UnterminatedBlock {
                    name: body.header.name.to_string(),
                    span: body.open.clone(),
                };

                if self.mode == ExtractMode::Strict {
                    return Err(err);
                }

                log::warn!("{err}; truncating it at the end of input");

                let end = self.text.trim_end().len();
                let block = body.into_block(self.text, end);

                self.blocks.push(block);
            }
        }

        Ok(self.blocks)
    }
}
