use console::Term;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Output context derived from global flags.
pub struct OutputContext {
    pub quiet: bool,
    pub use_color: bool,
}

impl OutputContext {
    /// Construct from global CLI options.
    pub fn from_global(global: &GlobalOpts) -> Self {
        let use_color = !global.no_color
            && std::env::var("TERM").map_or(true, |t| t != "dumb")
            && Term::stderr().is_term();

        Self {
            quiet: global.quiet,
            use_color,
        }
    }

    /// Print a success message to stderr (not in quiet mode).
    pub fn success(&self, msg: &str) {
        if self.quiet {
            return;
        }
        if self.use_color {
            let style = console::Style::new().green().bold();
            eprintln!("{} {}", style.apply_to("ok"), msg);
        } else {
            eprintln!("ok {msg}");
        }
    }

    /// Print a warning to stderr (not in quiet mode).
    pub fn warn(&self, msg: &str) {
        if self.quiet {
            return;
        }
        if self.use_color {
            let style = console::Style::new().yellow().bold();
            eprintln!("{} {}", style.apply_to("warning:"), msg);
        } else {
            eprintln!("warning: {msg}");
        }
    }

    pub fn print_error(&self, err: &CliError) {
        if self.use_color {
            let style = console::Style::new().red().bold();
            eprintln!("{} {}", style.apply_to("error:"), err);
        } else {
            eprintln!("error: {err}");
        }
    }

    /// Print command output to stdout.
    pub fn print(&self, text: &str) {
        println!("{}", text.trim_end());
    }
}
