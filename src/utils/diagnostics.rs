//! Error reporting.

use std::io::{self, IsTerminal};
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic as InnerDiagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use codespan_reporting::term::{self, Config};

use crate::pipeline::{Input, Sources};
use crate::tables::MAX_INDEX_BITS;
use crate::Error;

pub struct Diagnostic(InnerDiagnostic<usize>);

impl Diagnostic {
    pub fn error() -> Diagnostic {
        Self(InnerDiagnostic::error())
    }

    pub fn with_message<M: Into<String>>(mut self, message: M) -> Diagnostic {
        self.0.message = message.into();
        self
    }

    pub fn with_primary<S, L>(mut self, file: usize, span: S, label: L) -> Diagnostic
    where
        S: Into<Range<usize>>,
        L: Into<String>,
    {
        self.0
            .labels
            .push(Label::primary(file, span).with_message(label));

        self
    }

    pub fn with_note<N: Into<String>>(mut self, note: N) -> Diagnostic {
        self.0.notes.push(note.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        match err {
            Error::Io { path, source } => Diagnostic::error()
                .with_message(format!("cannot access `{}`", path.display()))
                .with_note(source.to_string()),
            Error::UnterminatedBlock(block) => Diagnostic::error()
                .with_message(block.to_string())
                .with_primary(
                    Input::Parameters.id(),
                    block.span.clone(),
                    "unclosed struct starts here",
                )
                .with_note("without `--strict` the struct runs to the end of input"),
            Error::TableTooLarge(table) => {
                let note = if table.bits > u64::from(MAX_INDEX_BITS) {
                    format!(
                        "tables are limited to {MAX_INDEX_BITS}-bit indices; narrow the operand types of `{}`",
                        table.key,
                    )
                } else {
                    format!(
                        "raise `--max-table-bits` to at least {} to generate it",
                        table.bits,
                    )
                };

                Diagnostic::error()
                    .with_message(table.to_string())
                    .with_note(note)
            }
        }
    }
}

pub struct Reporter<'src> {
    files: SimpleFiles<&'src str, &'src str>,
    writer: StandardStream,
}

impl<'src> Reporter<'src> {
    /// Creates a reporter with no source files, for failures that precede
    /// reading the inputs.
    pub fn empty() -> Reporter<'src> {
        let choice = if io::stderr().is_terminal() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };

        Reporter {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(choice),
        }
    }

    /// Creates a reporter over every input, with file ids given by
    /// [`Input::id`].
    pub fn new(sources: &'src Sources) -> Reporter<'src> {
        let mut reporter = Reporter::empty();

        for file in sources.files() {
            reporter.files.add(file.name.as_str(), file.text.as_str());
        }

        reporter
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic) {
        if let Err(err) = term::emit(
            &mut self.writer,
            &Config::default(),
            &self.files,
            &diagnostic.0,
        ) {
            log::error!("{}: {err}", diagnostic.message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::UnterminatedBlock;
    use crate::tables::{TableKey, TableTooLarge};

    #[test]
    fn unterminated_block_is_labelled() {
        let err = Error::UnterminatedBlock(UnterminatedBlock {
            name: "config2".to_string(),
            span: 7..23,
        });

        let diagnostic = Diagnostic::from(&err);

        assert_eq!(diagnostic.message(), "struct `config2` is never closed");
        assert_eq!(diagnostic.0.labels.len(), 1);
        assert_eq!(diagnostic.0.labels[0].file_id, Input::Parameters.id());
        assert_eq!(diagnostic.0.labels[0].range, 7..23);
    }

    #[test]
    fn io_error_names_path() {
        let err = Error::io(
            "../defines.h",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );

        let diagnostic = Diagnostic::from(&err);

        assert_eq!(diagnostic.message(), "cannot access `../defines.h`");
        assert_eq!(diagnostic.0.notes, vec!["not found".to_string()]);
    }

    fn table_note(width: u32, limit: u32) -> String {
        let key = TableKey::Add { width };
        let err = Error::TableTooLarge(TableTooLarge {
            key,
            bits: key.index_bits(),
            limit,
        });

        Diagnostic::from(&err).0.notes.remove(0)
    }

    #[test]
    fn table_limit_note() {
        assert_eq!(
            table_note(11, 20),
            "raise `--max-table-bits` to at least 22 to generate it"
        );
        assert_eq!(
            table_note(17, 32),
            "tables are limited to 32-bit indices; narrow the operand types of `add_table_17`"
        );
    }
}
