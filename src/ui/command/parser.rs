use super::r#break::BreakpointIdentity;
use super::{r#break, Command, CommandError, CommandResult};
use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, Boxed, IterParser, Parser};

pub const CONTEXT_COMMAND: &str = "context";
pub const CONTEXT_COMMAND_SHORT: &str = "ctx";
pub const STEP_INSTRUCTION_COMMAND: &str = "stepi";
pub const STEP_INSTRUCTION_COMMAND_SHORT: &str = "si";
pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const BREAK_COMMAND: &str = "break";
pub const BREAK_COMMAND_SHORT: &str = "b";
pub const BREAK_REMOVE_SUBCOMMAND: &str = "remove";
pub const TELESCOPE_COMMAND: &str = "telescope";
pub const TELESCOPE_COMMAND_SHORT: &str = "tel";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const QUIT_COMMAND: &str = "quit";
pub const QUIT_COMMAND_SHORT: &str = "q";

/// Upper bound of slots printed by a single telescope command.
pub const TELESCOPE_MAX_COUNT: usize = 4096;

type Err<'a> = extra::Err<Rich<'a, char>>;

pub fn hex<'a>() -> impl chumsky::Parser<'a, &'a str, usize, Err<'a>> + Clone {
    let prefix = just("0x").or(just("0X"));
    prefix
        .ignore_then(
            text::digits(16)
                .at_least(1)
                .to_slice()
                .try_map(|s: &str, span| {
                    usize::from_str_radix(s, 16).map_err(|e| Rich::custom(span, e))
                }),
        )
        .padded()
        .labelled("hexidecimal number")
}

fn telescope_count<'a>() -> impl chumsky::Parser<'a, &'a str, usize, Err<'a>> + Clone {
    text::int(10)
        .try_map(|s: &str, span| {
            let count: usize = s.parse().map_err(|e| Rich::custom(span, e))?;
            if count > TELESCOPE_MAX_COUNT {
                return Err(Rich::custom(
                    span,
                    format!("count must not exceed {TELESCOPE_MAX_COUNT}"),
                ));
            }
            Ok(count)
        })
        .padded()
        .labelled("slot count")
}

fn word<'a>() -> impl chumsky::Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .padded()
}

pub fn brkpt_at_addr_parser<'a>() -> impl chumsky::Parser<'a, &'a str, BreakpointIdentity, Err<'a>>
{
    hex().map(BreakpointIdentity::Address)
}

pub fn brkpt_at_fn<'a>() -> impl chumsky::Parser<'a, &'a str, BreakpointIdentity, Err<'a>> {
    word().map(|fn_name: &str| BreakpointIdentity::Function(fn_name.to_string()))
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: chumsky::Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        if input.trim().is_empty() {
            return Ok(Command::SkipInput);
        }

        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|e| CommandError::Parsing(e[0].to_string()))
    }

    fn parser<'a>() -> impl chumsky::Parser<'a, &'a str, Command, Err<'a>> {
        let op = |sym| just(sym).padded();
        let op2 = |full, short| op(full).or(op(short));

        let context = op2(CONTEXT_COMMAND, CONTEXT_COMMAND_SHORT)
            .ignore_then(word().repeated().collect::<Vec<_>>())
            .map(|selectors| {
                Command::Context(selectors.into_iter().map(ToString::to_string).collect())
            })
            .boxed();

        let stepi = op2(STEP_INSTRUCTION_COMMAND, STEP_INSTRUCTION_COMMAND_SHORT)
            .to(Command::StepInstruction);
        let r#continue = op2(CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT).to(Command::Continue);

        let r#break = op2(BREAK_COMMAND, BREAK_COMMAND_SHORT)
            .ignore_then(choice((
                op(BREAK_REMOVE_SUBCOMMAND)
                    .ignore_then(hex())
                    .map(|addr| Command::Breakpoint(r#break::Command::Remove(addr))),
                choice((brkpt_at_addr_parser(), brkpt_at_fn()))
                    .map(|brkpt| Command::Breakpoint(r#break::Command::Add(brkpt))),
            )))
            .boxed();

        let telescope = op2(TELESCOPE_COMMAND, TELESCOPE_COMMAND_SHORT)
            .ignore_then(hex().then(telescope_count().or_not()))
            .map(|(addr, count)| Command::Telescope { addr, count })
            .boxed();

        let help = op2(HELP_COMMAND, HELP_COMMAND_SHORT).to(Command::Help);
        let quit = op2(QUIT_COMMAND, QUIT_COMMAND_SHORT).to(Command::Quit);

        choice((
            command(CONTEXT_COMMAND, context),
            command(STEP_INSTRUCTION_COMMAND, stepi),
            command(CONTINUE_COMMAND, r#continue),
            command(BREAK_COMMAND, r#break),
            command(TELESCOPE_COMMAND, telescope),
            command(HELP_COMMAND, help),
            command(QUIT_COMMAND, quit),
        ))
        .map_err(|e| {
            let span = e.span();
            if span.start == 0 && span.end == 0 {
                Rich::custom(*e.span(), "type help for list of commands")
            } else {
                e
            }
        })
    }
}
