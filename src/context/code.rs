use crate::context::{Backend, ViewContext};
use crate::debugger::Error;
use crate::ui::style;
use crate::weak_error;
use unicode_width::UnicodeWidthStr;

const CURRENT_MARKER: &str = " =>";
const NO_MARKER: &str = "   ";

/// Disassembly window starting at the program counter.
///
/// The view always takes `code_rows` rows: a short window is prefixed with blank lines,
/// so that views below it keep their position on the screen between stops.
pub struct CodeView<'a, B: Backend> {
    ctx: &'a ViewContext<'a, B>,
}

impl<'a, B: Backend> CodeView<'a, B> {
    pub fn new(ctx: &'a ViewContext<'a, B>) -> Self {
        Self { ctx }
    }

    pub fn render(&self) -> Result<Vec<String>, Error> {
        let backend = self.ctx.backend;
        let config = self.ctx.config;
        let pc = self.ctx.snapshot.pc()?;

        let instructions =
            weak_error!(backend.disasm_window(pc, config.code_instructions), "disassembly:")
                .unwrap_or_default();

        // pc may be in a region mapped after the last map lookup
        backend.find_region(pc);

        let mut lines: Vec<String> = (0..config.code_rows.saturating_sub(instructions.len()))
            .map(|_| String::new())
            .collect();

        if instructions.is_empty() {
            return Ok(lines);
        }

        let symbols: Vec<String> = instructions
            .iter()
            .map(|i| {
                backend
                    .lookup_symbol(i.address)
                    .map(|sym| format!("<{sym}> "))
                    .unwrap_or_default()
            })
            .collect();
        let longest_sym = symbols.iter().map(|s| s.width()).max().unwrap_or_default();

        lines.extend(instructions.iter().zip(symbols).map(|(instruction, sym)| {
            let prefix = if instruction.address == pc {
                CURRENT_MARKER
            } else {
                NO_MARKER
            };
            format!(
                "{prefix} {}{} {}",
                style::pad_to_width(&sym, longest_sym),
                instruction.address,
                style::asm(instruction, self.ctx.theme),
            )
        }));

        Ok(lines)
    }
}
