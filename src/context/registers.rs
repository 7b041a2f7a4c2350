use crate::context::{Backend, ViewContext};
use crate::debugger::Error;
use crate::ui::style::{ErrorView, RegisterNameView};

pub const UNAVAILABLE: &str = "<unavailable>";

/// General purpose registers, frame pointer, stack pointer and program counter,
/// each followed by its pointer chain.
pub struct RegistersView<'a, B: Backend> {
    ctx: &'a ViewContext<'a, B>,
}

impl<'a, B: Backend> RegistersView<'a, B> {
    pub fn new(ctx: &'a ViewContext<'a, B>) -> Self {
        Self { ctx }
    }

    pub fn render(&self) -> Result<Vec<String>, Error> {
        let resolver = self.ctx.resolver();
        let theme = self.ctx.theme;

        let lines = self
            .ctx
            .snapshot
            .registers()
            .iter()
            .map(|(register, value)| {
                let name = format!("{:<4}", register.to_string().to_uppercase());
                let name = RegisterNameView::new(name, theme);
                match value {
                    Some(value) => {
                        let chain = resolver.resolve(self.ctx.backend, *value);
                        format!("{name} {}", self.ctx.format_chain(&chain))
                    }
                    None => format!("{name} {}", ErrorView::new(UNAVAILABLE, theme)),
                }
            })
            .collect();
        Ok(lines)
    }
}
