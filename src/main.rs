use std::process::ExitCode;

use hls_ram_tables::opts::Opts;
use hls_ram_tables::pipeline::{self, Sources};
use hls_ram_tables::utils::{Diagnostic, Reporter};

fn main() -> ExitCode {
    let opts = Opts::parse();

    env_logger::Builder::new()
        .filter_level(opts.log_level)
        .init();

    let sources = match Sources::read(opts.inputs()) {
        Ok(sources) => sources,
        Err(err) => {
            Reporter::empty().emit(&Diagnostic::from(&err));

            return ExitCode::FAILURE;
        }
    };

    let mut reporter = Reporter::new(&sources);

    let result = pipeline::generate(&sources, &opts.config()).and_then(
        |artifacts| pipeline::write_artifacts(&artifacts, &opts.output),
    );

    match result {
        Ok(paths) => {
            log::info!("Generated {} files", paths.len());

            ExitCode::SUCCESS
        }
        Err(err) => {
            reporter.emit(&Diagnostic::from(&err));

            ExitCode::FAILURE
        }
    }
}
