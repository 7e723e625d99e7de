use clap::Parser;
use cyclic_data::cli::commands;
use cyclic_data::cli::{Cli, Commands, GlobalOpts};
use miette::Result;
use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` overrides the level from -v/-q
fn init_tracing(global: &GlobalOpts) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cyclic_data={level},{level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head` causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Import(args) => commands::import::run(args, &global),
        Commands::List(args) => commands::list::run(args, &global),
        Commands::Show(args) => commands::show::run(args, &global),
        Commands::Table(args) => commands::table::run(args, &global),
        Commands::Cycles(args) => commands::cycles::run(args, &global),
        Commands::Vm(args) => commands::vm::run(args, &global),
        Commands::Yield(args) => commands::yield_point::run(args, &global),
        Commands::Smooth(args) => commands::smooth::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
