//! Context dashboard of a stopped process.
//!
//! A dashboard is a single report that combines registers (with pointer chains),
//! a disassembly window around the program counter, a telescope of the stack and
//! a backtrace. Every view reads the process state through the [`Backend`] trait and a
//! per-render [`Snapshot`], so views are independent of a live process.
//!
//! Views degrade locally: an unreadable value ends a chain, an unknown symbol yields
//! an empty annotation, a failed view renders an error line under its banner. Only
//! an unavailable backend fails the whole render.

pub mod backtrace;
pub mod chain;
pub mod code;
pub mod registers;
pub mod snapshot;
pub mod stack;

#[cfg(test)]
pub(crate) mod fake;

use crate::config::{ContextConfig, Theme};
use crate::debugger::address::RelocatedAddress;
use crate::debugger::disasm::Instruction;
use crate::debugger::register::{Arch, Register};
use crate::debugger::vmmap::Region;
use crate::debugger::Error;
use crate::ui::style;
use crate::ui::style::ErrorView;
use backtrace::BacktraceView;
use chain::{Chain, ChainResolver};
use code::CodeView;
use log::warn;
use registers::RegistersView;
use stack::StackView;
use std::fmt::{Display, Formatter};
use strum_macros::Display;

pub use snapshot::Snapshot;

/// Call stack frame, read-only.
pub trait StackFrame: Sized {
    /// Program counter of the frame.
    fn pc(&self) -> RelocatedAddress;
    /// Function name if known.
    fn name(&self) -> Option<String>;
    /// Next older frame (caller) if any.
    fn older(&self) -> Option<Self>;
}

/// Process state provider used by the dashboard.
pub trait Backend {
    type Frame: StackFrame;

    fn arch(&self) -> &Arch;

    /// Return an error if there is no process to inspect.
    fn check_alive(&self) -> Result<(), Error>;

    fn read_register(&self, register: Register) -> Result<u64, Error>;

    fn read_memory(&self, addr: RelocatedAddress, len: usize) -> Result<Vec<u8>, Error>;

    /// Decode up to `max_count` instructions starting at `start`.
    fn disasm_window(
        &self,
        start: RelocatedAddress,
        max_count: usize,
    ) -> Result<Vec<Instruction>, Error>;

    /// Symbol annotation for an address (`name` or `name+0xoff`).
    fn lookup_symbol(&self, addr: RelocatedAddress) -> Option<String>;

    /// Memory region containing an address, may trigger discovery of new mappings.
    fn find_region(&self, addr: RelocatedAddress) -> Option<Region>;

    /// Innermost frame of the current thread.
    fn current_frame(&self) -> Option<Self::Frame>;

    /// Read a pointer-sized value.
    fn read_pointer(&self, addr: RelocatedAddress) -> Result<u64, Error> {
        let bytes = self.read_memory(addr, self.arch().ptr_size)?;
        let value = match bytes.len() {
            4 => u32::from_ne_bytes(bytes.as_slice().try_into().expect("infallible")) as u64,
            8 => u64::from_ne_bytes(bytes.as_slice().try_into().expect("infallible")),
            _ => return Err(Error::TypeBinaryRepr("pointer", bytes.into_boxed_slice())),
        };
        Ok(value)
    }
}

/// Dashboard section.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    Registers,
    Code,
    Stack,
    Backtrace,
}

impl Section {
    /// All sections in render order.
    pub const ALL: [Section; 4] = [
        Section::Registers,
        Section::Code,
        Section::Stack,
        Section::Backtrace,
    ];

    /// Parse a view selector, only the first character matters (case-insensitive).
    pub fn from_selector(token: &str) -> Option<Self> {
        match token.chars().next()?.to_ascii_lowercase() {
            'r' => Some(Section::Registers),
            'c' => Some(Section::Code),
            's' => Some(Section::Stack),
            'b' => Some(Section::Backtrace),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Section::Registers => 0,
            Section::Code => 1,
            Section::Stack => 2,
            Section::Backtrace => 3,
        }
    }
}

/// Set of requested sections, iterated in render order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SectionSet([bool; 4]);

impl SectionSet {
    pub fn all() -> Self {
        Self([true; 4])
    }

    pub fn empty() -> Self {
        Self([false; 4])
    }

    /// Build a set from view selectors. No selectors means all sections,
    /// unrecognized selectors are ignored.
    pub fn from_selectors<S: AsRef<str>>(tokens: &[S]) -> Self {
        if tokens.is_empty() {
            return Self::all();
        }
        let mut set = Self::empty();
        tokens
            .iter()
            .filter_map(|t| Section::from_selector(t.as_ref()))
            .for_each(|s| set.insert(s));
        set
    }

    pub fn insert(&mut self, section: Section) {
        self.0[section.index()] = true;
    }

    pub fn contains(&self, section: Section) -> bool {
        self.0[section.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = Section> + '_ {
        Section::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl Default for SectionSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Rendered dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Everything a view needs to render itself.
pub struct ViewContext<'a, B: Backend> {
    pub backend: &'a B,
    pub snapshot: &'a Snapshot,
    pub config: &'a ContextConfig,
    pub theme: Theme,
}

impl<'a, B: Backend> ViewContext<'a, B> {
    pub fn resolver(&self) -> ChainResolver {
        ChainResolver::new(self.config.max_chain_hops)
    }

    pub fn format_chain(&self, chain: &Chain) -> String {
        chain::format_chain(self.backend, chain, self.theme)
    }

    pub fn ptr_size(&self) -> usize {
        self.backend.arch().ptr_size
    }
}

/// Renders context dashboards.
pub struct Dashboard<'a, B: Backend> {
    backend: &'a B,
    config: &'a ContextConfig,
    theme: Theme,
}

impl<'a, B: Backend> Dashboard<'a, B> {
    pub fn new(backend: &'a B, config: &'a ContextConfig, theme: Theme) -> Self {
        Self {
            backend,
            config,
            theme,
        }
    }

    /// Render requested sections. Fails only if the backend is not available,
    /// errors of a single view are rendered in place of its content.
    pub fn render(&self, sections: SectionSet) -> Result<Report, Error> {
        self.backend.check_alive()?;

        let snapshot = Snapshot::capture(self.backend);
        let ctx = ViewContext {
            backend: self.backend,
            snapshot: &snapshot,
            config: self.config,
            theme: self.theme,
        };
        let width = style::report_width(self.config.width);

        let mut lines = vec![style::legend(self.theme)];
        for section in sections.iter() {
            lines.push(style::banner(&section.to_string(), width, self.theme));
            match Self::render_section(&ctx, section) {
                Ok(section_lines) => lines.extend(section_lines),
                Err(e) => {
                    warn!(target: "context", "{section} view: {e:#}");
                    let msg = format!("{section} unavailable: {e}");
                    lines.push(ErrorView::new(msg, self.theme).to_string());
                }
            }
        }

        Ok(Report { lines })
    }

    fn render_section(ctx: &ViewContext<B>, section: Section) -> Result<Vec<String>, Error> {
        match section {
            Section::Registers => RegistersView::new(ctx).render(),
            Section::Code => CodeView::new(ctx).render(),
            Section::Stack => StackView::new(ctx).render(),
            Section::Backtrace => Ok(BacktraceView::new(ctx).render()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::fake::FakeBackend;

    fn banners(report: &Report) -> Vec<&str> {
        report
            .lines()
            .iter()
            .filter(|l| l.starts_with('─'))
            .map(|l| l.trim_matches('─'))
            .collect()
    }

    #[test]
    fn test_section_selectors() {
        struct TestCase {
            tokens: Vec<&'static str>,
            expected: Vec<Section>,
        }

        let cases = [
            TestCase {
                tokens: vec![],
                expected: Section::ALL.to_vec(),
            },
            TestCase {
                tokens: vec!["r"],
                expected: vec![Section::Registers],
            },
            TestCase {
                tokens: vec!["Backtrace", "REG", "stack"],
                expected: vec![Section::Registers, Section::Stack, Section::Backtrace],
            },
            TestCase {
                tokens: vec!["code", "xyz", "", "c"],
                expected: vec![Section::Code],
            },
            TestCase {
                tokens: vec!["unknown"],
                expected: vec![],
            },
        ];

        for tc in cases {
            let set = SectionSet::from_selectors(&tc.tokens);
            assert_eq!(set.iter().collect::<Vec<_>>(), tc.expected);
        }
    }

    #[test]
    fn test_render_registers_only() {
        let backend = FakeBackend::sample();
        let config = FakeBackend::config();
        let dashboard = Dashboard::new(&backend, &config, Theme::None);

        let report = dashboard
            .render(SectionSet::from_selectors(&["r"]))
            .unwrap();
        assert!(report.lines()[0].starts_with("LEGEND:"));
        assert_eq!(banners(&report), vec!["[ REGISTERS ]"]);
        assert_eq!(
            report.lines().len(),
            2 + backend.arch().context_registers().count()
        );
    }

    #[test]
    fn test_render_all_in_order() {
        let backend = FakeBackend::sample();
        let config = FakeBackend::config();
        let dashboard = Dashboard::new(&backend, &config, Theme::None);

        let report = dashboard.render(SectionSet::default()).unwrap();
        assert_eq!(
            banners(&report),
            vec!["[ REGISTERS ]", "[ CODE ]", "[ STACK ]", "[ BACKTRACE ]"]
        );

        let report = dashboard
            .render(SectionSet::from_selectors(&["b", "s", "c", "r"]))
            .unwrap();
        assert_eq!(
            banners(&report),
            vec!["[ REGISTERS ]", "[ CODE ]", "[ STACK ]", "[ BACKTRACE ]"]
        );
    }

    #[test]
    fn test_render_only_legend_for_unknown_selectors() {
        let backend = FakeBackend::sample();
        let config = FakeBackend::config();
        let dashboard = Dashboard::new(&backend, &config, Theme::None);

        let report = dashboard
            .render(SectionSet::from_selectors(&["x", "yz"]))
            .unwrap();
        assert_eq!(report.lines().len(), 1);
        assert!(report.to_string().starts_with("LEGEND:"));
    }

    #[test]
    fn test_render_dead_backend() {
        let mut backend = FakeBackend::sample();
        backend.alive = false;
        let config = FakeBackend::config();
        let dashboard = Dashboard::new(&backend, &config, Theme::None);

        let err = dashboard.render(SectionSet::all()).unwrap_err();
        assert!(matches!(err, Error::ProcessNotStarted));
    }

    #[test]
    fn test_failed_view_does_not_break_others() {
        let mut backend = FakeBackend::sample();
        backend.registers.remove(&Register::Rip);
        backend.registers.remove(&Register::Rsp);
        let config = FakeBackend::config();
        let dashboard = Dashboard::new(&backend, &config, Theme::None);

        let report = dashboard.render(SectionSet::all()).unwrap();
        assert_eq!(
            banners(&report),
            vec!["[ REGISTERS ]", "[ CODE ]", "[ STACK ]", "[ BACKTRACE ]"]
        );
        let text = report.to_string();
        assert!(text.contains("RIP  <unavailable>"));
        assert!(text.contains("code unavailable: register rip unavailable"));
        assert!(text.contains("stack unavailable: register rsp unavailable"));
        assert!(text.contains("f 0 0x0000000000401000 main"));
    }
}
