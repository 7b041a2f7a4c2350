use crate::config::{ContextConfig, Theme};
use crate::context::chain::{format_chain, ChainResolver};
use crate::context::{Backend, Snapshot, ViewContext};
use crate::debugger::address::RelocatedAddress;
use crate::debugger::Error;
use crate::muted_error;
use crate::ui::style::{AddressView, ErrorView, KeywordView};
use std::fmt::Write;

pub const UNREADABLE: &str = "<unreadable>";

/// Memory dump of consecutive pointer-sized slots, each slot followed by
/// the pointer chain of its value.
pub struct Telescope<'a, B: Backend> {
    backend: &'a B,
    resolver: ChainResolver,
    theme: Theme,
    markers: Option<&'a Snapshot>,
}

impl<'a, B: Backend> Telescope<'a, B> {
    pub fn new(backend: &'a B, resolver: ChainResolver, theme: Theme) -> Self {
        Self {
            backend,
            resolver,
            theme,
            markers: None,
        }
    }

    /// Mark slots with the names of registers pointing to them.
    pub fn with_markers(self, snapshot: &'a Snapshot) -> Self {
        Self {
            markers: Some(snapshot),
            ..self
        }
    }

    pub fn render(&self, address: RelocatedAddress, count: usize) -> Vec<String> {
        let ptr_size = self.backend.arch().ptr_size;

        (0..count)
            .map(|i| {
                let offset = i * ptr_size;
                let slot = address.offset(offset as isize);

                let mut line = format!(
                    "{i:02}:{offset:04x}│ {} ",
                    AddressView::new(slot, self.theme)
                );
                for register in self
                    .markers
                    .map(|s| s.registers_pointing_to(slot))
                    .unwrap_or_default()
                {
                    _ = write!(line, "{} ", KeywordView::new(register, self.theme));
                }

                match muted_error!(self.backend.read_pointer(slot)) {
                    Some(value) => {
                        let chain = self.resolver.resolve(self.backend, value);
                        line.push_str(&format_chain(self.backend, &chain, self.theme));
                    }
                    None => {
                        _ = write!(line, "{}", ErrorView::new(UNREADABLE, self.theme));
                    }
                }
                line
            })
            .collect()
    }
}

/// Telescope `count` slots starting at `address` with default settings.
pub fn telescope<B: Backend>(backend: &B, address: RelocatedAddress, count: usize) -> Vec<String> {
    let resolver = ChainResolver::new(ContextConfig::default().max_chain_hops);
    Telescope::new(backend, resolver, Theme::default()).render(address, count)
}

/// Telescope of the stack starting at the stack pointer.
pub struct StackView<'a, B: Backend> {
    ctx: &'a ViewContext<'a, B>,
}

impl<'a, B: Backend> StackView<'a, B> {
    pub fn new(ctx: &'a ViewContext<'a, B>) -> Self {
        Self { ctx }
    }

    pub fn render(&self) -> Result<Vec<String>, Error> {
        let sp = self.ctx.snapshot.sp()?;
        let lines = Telescope::new(self.ctx.backend, self.ctx.resolver(), self.ctx.theme)
            .with_markers(self.ctx.snapshot)
            .render(sp, self.ctx.config.stack_slots);
        Ok(lines)
    }
}
