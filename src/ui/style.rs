//! Terminal markup for dashboard elements.
//!
//! Every view is parametrized by a [`Theme`], theme [`Theme::None`] produces plain text.

use crate::config::Theme;
use crate::debugger::address::RelocatedAddress;
use crate::debugger::disasm::Instruction;
use crate::debugger::vmmap::RegionKind;
use crossterm::style::{Color, Stylize};
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use unicode_width::UnicodeWidthStr;

pub const UNKNOWN_PLACEHOLDER: &str = "???";
const DEFAULT_WIDTH: usize = 80;

struct View<T: Display> {
    inner: Option<T>,
    color: Option<Color>,
    bold: bool,
}

impl<T: Display> Display for View<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = self
            .inner
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| UNKNOWN_PLACEHOLDER.to_string());

        match (self.color, self.bold) {
            (None, false) => f.write_str(&text),
            (None, true) => f.write_fmt(format_args!("{}", text.bold())),
            (Some(color), false) => f.write_fmt(format_args!("{}", text.with(color))),
            (Some(color), true) => f.write_fmt(format_args!("{}", text.with(color).bold())),
        }
    }
}

/// Construct structure declaration to display data of the same type (addresses, function names, etc.).
/// Style is dropped when theme is [`Theme::None`].
macro_rules! view_struct {
    ($name: ident, $color: expr) => {
        view_struct!($name, $color, false);
    };
    ($name: ident, $color: expr, $bold: expr) => {
        pub struct $name<T: Display>(View<T>);

        impl<T: Display> $name<T> {
            pub fn new(value: impl Into<Option<T>>, theme: Theme) -> Self {
                let colored = theme != Theme::None;
                Self(View {
                    inner: value.into(),
                    color: colored.then_some($color).flatten(),
                    bold: colored && $bold,
                })
            }
        }

        impl<T: Display> Display for $name<T> {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

view_struct!(AddressView, Some(Color::Blue));
view_struct!(FunctionNameView, Some(Color::Yellow));
view_struct!(KeywordView, Some(Color::Magenta));
view_struct!(AsmInstructionView, Some(Color::DarkRed));
view_struct!(AsmOperandsView, Some(Color::DarkGreen));
view_struct!(ErrorView, Some(Color::Red));
view_struct!(BannerView, Some(Color::Blue));
view_struct!(RegisterNameView, None, true);

fn region_color(kind: RegionKind) -> Option<Color> {
    match kind {
        RegionKind::Stack => Some(Color::Yellow),
        RegionKind::Heap => Some(Color::Blue),
        RegionKind::Code => Some(Color::Red),
        RegionKind::Data => Some(Color::Magenta),
        RegionKind::Rwx => Some(Color::Green),
        RegionKind::Rodata => None,
    }
}

/// Value colored by the kind of memory region it points to.
pub struct RegionValueView {
    value: RelocatedAddress,
    color: Option<Color>,
}

impl RegionValueView {
    pub fn new(value: RelocatedAddress, kind: Option<RegionKind>, theme: Theme) -> Self {
        let color = kind.and_then(region_color).filter(|_| theme != Theme::None);
        Self { value, color }
    }
}

impl Display for RegionValueView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.color {
            None => f.write_fmt(format_args!("{}", self.value)),
            Some(color) => f.write_fmt(format_args!("{}", self.value.to_string().with(color))),
        }
    }
}

/// Color key for region kinds.
pub fn legend(theme: Theme) -> String {
    let kinds = RegionKind::ALL
        .iter()
        .map(|&kind| {
            RegionKind::title(kind)
                .to_string()
                .with_theme(region_color(kind), theme)
        })
        .join(" | ");
    format!("LEGEND: {kinds}")
}

trait WithTheme {
    fn with_theme(self, color: Option<Color>, theme: Theme) -> String;
}

impl WithTheme for String {
    fn with_theme(self, color: Option<Color>, theme: Theme) -> String {
        match color.filter(|_| theme != Theme::None) {
            None => self,
            Some(color) => self.with(color).to_string(),
        }
    }
}

/// Section header line: title centered in a line of `width` characters.
pub fn banner(title: &str, width: usize, theme: Theme) -> String {
    let title = format!("[ {} ]", title.to_uppercase());
    let fill = width.saturating_sub(title.width());
    let left = fill / 2;
    let line = format!("{}{title}{}", "─".repeat(left), "─".repeat(fill - left));
    BannerView::new(line, theme).to_string()
}

/// Syntax colored instruction text.
pub fn asm(instruction: &Instruction, theme: Theme) -> String {
    let mnemonic = instruction.mnemonic.as_deref().unwrap_or("(bad)");
    match instruction.operands.as_deref().filter(|op| !op.is_empty()) {
        None => AsmInstructionView::new(mnemonic, theme).to_string(),
        Some(operands) => format!(
            "{} {}",
            AsmInstructionView::new(mnemonic, theme),
            AsmOperandsView::new(operands, theme)
        ),
    }
}

/// Width of a report line, falls back to terminal width.
pub fn report_width(configured: Option<usize>) -> usize {
    configured
        .or_else(|| {
            crossterm::terminal::size()
                .ok()
                .map(|(w, _)| w as usize)
                .filter(|&w| w > 0)
        })
        .unwrap_or(DEFAULT_WIDTH)
}

/// Right-pad a string with spaces up to `width` display columns.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(pad))
}
