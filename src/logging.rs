use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Installs the console subscriber.
///
/// `RUST_LOG` directives apply on top of the default `reading_log=info`
/// (`reading_log=debug` when `verbose`). Log lines go to stderr so that
/// command output on stdout stays clean. A second call is a no-op.
pub fn init_logging(verbose: bool) {
    let directive = if verbose { "reading_log=debug" } else { "reading_log=info" };
    let filter = match directive.parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
