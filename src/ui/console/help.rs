pub const HELP: &str = r#"
Available commands:

ctx, context <>|<view>...                   -- show context dashboard, views: registers, code, stack, backtrace
si, stepi                                   -- step one instruction
c, continue                                 -- continue program being debugged, after signal or breakpoint
b, break <addr>|<function>                  -- set breakpoint at address or function start
b, break remove <addr>                      -- remove breakpoint
tel, telescope <addr> <>|<count>            -- dereference memory slots starting at address (count up to 4096)
h, help                                     -- show help
q, quit                                     -- exit lookout
"#;
