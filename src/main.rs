use anyhow::Context;
use clap::Parser;
use lookout::config::{Config, Theme};
use lookout::debugger::process::Child;
use lookout::debugger::Debugger;
use lookout::ui::console::TerminalApplication;
use nix::unistd::Pid;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Attach to a running process instead of starting a new one
    #[clap(short, long)]
    pid: Option<i32>,

    /// Path to config file, `~/.config/lookout/config.toml` by default
    #[clap(long)]
    config: Option<PathBuf>,

    /// Dashboard theme (none or default)
    #[clap(long, env = "LOOKOUT_THEME")]
    theme: Option<Theme>,

    /// Views shown after every stop: r(egisters), c(ode), s(tack), b(acktrace)
    #[clap(short, long)]
    view: Vec<String>,

    /// Program to debug
    program: Option<String>,

    /// Program arguments
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref());
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if !args.view.is_empty() {
        config.views = args.view;
    }

    let process = match (args.pid, args.program) {
        (Some(pid), _) => Child::attach(Pid::from_raw(pid))
            .with_context(|| format!("attach to process {pid}"))?,
        (None, Some(program)) => {
            let path = which::which(&program)
                .with_context(|| format!("program `{program}` not found"))?;
            Child::spawn(path.to_string_lossy(), args.args)
                .with_context(|| format!("start program `{program}`"))?
        }
        (None, None) => anyhow::bail!("either a program or --pid must be specified"),
    };

    let debugger = Debugger::new(process)?;
    TerminalApplication::new(debugger, config)?.run()
}
