use crate::context::{Backend, StackFrame, ViewContext};
use crate::ui::style::{AddressView, FunctionNameView};

/// Call stack of the current thread, innermost frame first.
pub struct BacktraceView<'a, B: Backend> {
    ctx: &'a ViewContext<'a, B>,
}

impl<'a, B: Backend> BacktraceView<'a, B> {
    pub fn new(ctx: &'a ViewContext<'a, B>) -> Self {
        Self { ctx }
    }

    pub fn render(&self) -> Vec<String> {
        self.walk(self.ctx.backend.current_frame())
    }

    /// Render frames starting from `innermost`, at most `backtrace_depth` of them.
    pub fn walk(&self, innermost: Option<B::Frame>) -> Vec<String> {
        let ptr_size = self.ctx.ptr_size();
        let theme = self.ctx.theme;

        let mut lines = vec![];
        let mut current = innermost;
        while let Some(frame) = current {
            if lines.len() >= self.ctx.config.backtrace_depth {
                break;
            }
            lines.push(format!(
                "f {} {} {}",
                lines.len(),
                AddressView::new(frame.pc().sized(ptr_size), theme),
                FunctionNameView::<String>::new(frame.name(), theme),
            ));
            current = frame.older();
        }
        lines
    }
}
