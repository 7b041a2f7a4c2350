//! Interactive console: reads commands, drives the debugger and renders
//! a context dashboard after every stop.

mod editor;
mod help;

use crate::config::Config;
use crate::context::chain::ChainResolver;
use crate::context::stack::Telescope;
use crate::context::{Dashboard, SectionSet};
use crate::debugger::address::RelocatedAddress;
use crate::debugger::{Debugger, Error, StopReason};
use crate::ui::command::r#break::{BreakpointIdentity, ExecutionResult};
use crate::ui::command::{r#break, Command, CommandError};
use crate::ui::console::editor::{create_editor, RLHelper};
use crate::ui::style::{AddressView, ErrorView, FunctionNameView, KeywordView};
use itertools::Itertools;
use log::warn;
use rustyline::error::ReadlineError;
use rustyline::history::MemHistory;
use rustyline::Editor;

const WELCOME_TEXT: &str = "lookout greets";
const PROMT: &str = "(lk) ";

type LKEditor = Editor<RLHelper, MemHistory>;

enum Flow {
    Continue,
    Quit,
}

pub struct TerminalApplication {
    debugger: Debugger,
    editor: LKEditor,
    config: Config,
}

impl TerminalApplication {
    pub fn new(debugger: Debugger, config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            debugger,
            editor: create_editor(PROMT)?,
            config,
        })
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        println!("{WELCOME_TEXT}");
        self.on_stop(StopReason::Start);

        loop {
            let input = match self.editor.readline(PROMT) {
                Ok(input) => input,
                Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
                Err(err) => {
                    println!("error: {err:#}");
                    break;
                }
            };
            _ = self.editor.add_history_entry(&input);

            match self.handle_command(&input) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(CommandError::Handle(err)) if err.is_fatal() => {
                    self.on_fatal(err);
                    break;
                }
                Err(e) => println!("{}", ErrorView::new(format!("{e:#}"), self.config.theme)),
            }
        }

        Ok(())
    }

    fn handle_command(&mut self, cmd: &str) -> Result<Flow, CommandError> {
        match Command::parse(cmd)? {
            Command::Context(selectors) => {
                let sections = if selectors.is_empty() {
                    SectionSet::from_selectors(&self.config.views)
                } else {
                    SectionSet::from_selectors(&selectors)
                };
                self.render(sections)?;
            }
            Command::StepInstruction => {
                let reason = self.debugger.step_instruction()?;
                self.on_stop(reason);
            }
            Command::Continue => {
                let reason = self.debugger.continue_execution()?;
                self.on_stop(reason);
            }
            Command::Breakpoint(cmd) => {
                let theme = self.config.theme;
                match r#break::Handler::new(&mut self.debugger).handle(&cmd)? {
                    ExecutionResult::New(number, identity) => {
                        let place = match identity {
                            BreakpointIdentity::Address(addr) => {
                                AddressView::new(RelocatedAddress::from(addr), theme).to_string()
                            }
                            BreakpointIdentity::Function(name) => {
                                FunctionNameView::new(name, theme).to_string()
                            }
                        };
                        println!("New breakpoint {number} at {place}");
                    }
                    ExecutionResult::Removed(number) => println!("Removed breakpoint {number}"),
                }
            }
            Command::Telescope { addr, count } => {
                let resolver = ChainResolver::new(self.config.context.max_chain_hops);
                let count = count.unwrap_or(self.config.context.stack_slots);
                Telescope::new(&self.debugger, resolver, self.config.theme)
                    .render(RelocatedAddress::from(addr), count)
                    .into_iter()
                    .for_each(|line| println!("{line}"));
            }
            Command::Help => println!("{}", help::HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::SkipInput => {}
        }
        Ok(Flow::Continue)
    }

    fn render(&self, sections: SectionSet) -> Result<(), Error> {
        let dashboard = Dashboard::new(&self.debugger, &self.config.context, self.config.theme);
        let report = dashboard.render(sections)?;
        println!("{report}");
        Ok(())
    }

    fn on_stop(&self, reason: StopReason) {
        let theme = self.config.theme;
        match reason {
            StopReason::Start => {
                let process = self.debugger.process();
                let cmdline = std::iter::once(process.program())
                    .chain(process.args().iter().map(String::as_str))
                    .join(" ");
                println!(
                    "Process {} stopped: {cmdline}",
                    KeywordView::new(process.pid(), theme),
                );
            }
            StopReason::Step => {}
            StopReason::Breakpoint { number, addr } => {
                println!(
                    "Hit breakpoint {number} at {}",
                    AddressView::new(addr, theme)
                );
            }
            StopReason::Signal(signal) => {
                println!("Signal {} received", KeywordView::new(signal, theme));
            }
        }

        let sections = SectionSet::from_selectors(&self.config.views);
        if let Err(e) = self.render(sections) {
            warn!(target: "debugger", "render context: {e:#}");
            println!("{}", ErrorView::new(format!("{e:#}"), theme));
        }
    }

    fn on_fatal(&self, err: Error) {
        let theme = self.config.theme;
        match err {
            Error::ProcessExit(code) => {
                println!("Program exit with code: {code}");
            }
            Error::ProcessKilled(signal) => {
                println!("Program killed by signal: {}", KeywordView::new(signal, theme));
            }
            err => {
                println!("{}", ErrorView::new("shutdown debugger", theme));
                println!("{}", ErrorView::new(format!("fatal debugger error: {err:#}"), theme));
            }
        }
    }
}
