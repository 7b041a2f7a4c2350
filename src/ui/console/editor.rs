use crate::context::Section;
use crate::ui::command::parser::{
    BREAK_COMMAND, BREAK_COMMAND_SHORT, BREAK_REMOVE_SUBCOMMAND, CONTEXT_COMMAND,
    CONTEXT_COMMAND_SHORT, CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT, HELP_COMMAND,
    HELP_COMMAND_SHORT, QUIT_COMMAND, QUIT_COMMAND_SHORT, STEP_INSTRUCTION_COMMAND,
    STEP_INSTRUCTION_COMMAND_SHORT, TELESCOPE_COMMAND, TELESCOPE_COMMAND_SHORT,
};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::MemHistory;
use rustyline::{CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::collections::HashMap;

struct CommandHint {
    short: Option<String>,
    long: String,
    subcommands: Vec<String>,
}

impl CommandHint {
    fn display_with_short(&self) -> String {
        if let Some(ref short) = self.short {
            if self.long.starts_with(short) {
                format!(
                    "{}{}",
                    short.clone().bold().underlined(),
                    &self.long[short.len()..]
                )
            } else {
                format!("{}|{}", &self.long, short.clone().bold().underlined())
            }
        } else {
            self.long.clone()
        }
    }
}

impl From<(&str, &str)> for CommandHint {
    fn from((short, long): (&str, &str)) -> Self {
        CommandHint {
            short: Some(short.to_string()),
            long: long.to_string(),
            subcommands: vec![],
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    subcommand_hints: HashMap<String, Vec<String>>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        let commands: Vec<CommandHint> = commands.into_iter().collect();
        let subcommand_hints = commands
            .iter()
            .flat_map(|cmd| {
                let mut hints = vec![(cmd.long.clone(), cmd.subcommands.clone())];
                if let Some(ref short) = cmd.short {
                    hints.push((short.clone(), cmd.subcommands.clone()));
                }
                hints
            })
            .collect::<HashMap<String, Vec<String>>>();

        Self {
            commands,
            subcommand_hints,
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let trimmed = line.trim_start();
        if let Some((cmd, rest)) = trimmed.split_once(char::is_whitespace) {
            let Some(subcommands) = self.subcommand_hints.get(cmd) else {
                return Ok((0, vec![]));
            };
            let part = rest.rsplit(char::is_whitespace).next().unwrap_or_default();
            let pos = line.len() - part.len();
            let pairs = subcommands
                .iter()
                .filter(|subcmd| subcmd.starts_with(part))
                .map(|subcmd| Pair {
                    display: subcmd.to_string(),
                    replacement: subcmd.to_string(),
                })
                .collect();
            return Ok((pos, pairs));
        }

        let pairs = self
            .commands
            .iter()
            .filter(|cmd| cmd.long.starts_with(trimmed))
            .map(|cmd| Pair {
                display: cmd.display_with_short(),
                replacement: cmd.long.clone(),
            })
            .collect();
        Ok((line.len() - trimmed.len(), pairs))
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    completer: CommandCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("{}", hint.with(Color::Grey)))
    }
}

fn commands() -> Vec<CommandHint> {
    let sections: Vec<String> = Section::ALL.iter().map(ToString::to_string).collect();
    vec![
        CommandHint {
            short: Some(CONTEXT_COMMAND_SHORT.to_string()),
            long: CONTEXT_COMMAND.to_string(),
            subcommands: sections,
        },
        (STEP_INSTRUCTION_COMMAND_SHORT, STEP_INSTRUCTION_COMMAND).into(),
        (CONTINUE_COMMAND_SHORT, CONTINUE_COMMAND).into(),
        CommandHint {
            short: Some(BREAK_COMMAND_SHORT.to_string()),
            long: BREAK_COMMAND.to_string(),
            subcommands: vec![BREAK_REMOVE_SUBCOMMAND.to_string()],
        },
        (TELESCOPE_COMMAND_SHORT, TELESCOPE_COMMAND).into(),
        (HELP_COMMAND_SHORT, HELP_COMMAND).into(),
        (QUIT_COMMAND_SHORT, QUIT_COMMAND).into(),
    ]
}

pub fn create_editor(promt: &str) -> anyhow::Result<Editor<RLHelper, MemHistory>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let h = RLHelper {
        completer: CommandCompleter::new(commands()),
        hinter: HistoryHinter {},
        colored_prompt: format!("{}", promt.with(Color::DarkGreen)),
    };

    let mut editor = Editor::with_history(config, MemHistory::new())?;
    editor.set_helper(Some(h));

    Ok(editor)
}
