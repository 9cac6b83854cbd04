use tracing_subscriber::EnvFilter;

const QUIET: &str = "warn,odc=info,odc_fetch=info,odc_catalog=info";
const VERBOSE: &str = "warn,odc=debug,odc_fetch=debug,odc_catalog=debug,odc_verify=debug";

/// Log to stderr so stdout only carries command output. `RUST_LOG` wins.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE } else { QUIET }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
