use log::warn;
use nix::sys::signal::{signal, SigHandler, Signal};

const INTERACTIVE_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// shell 本身忽略 Ctrl-C / Ctrl-\，由前台子进程处理
pub fn ignore_interactive_signals() {
    set_handler(SigHandler::SigIgn);
}

/// 子进程在 exec 之前恢复默认处理，否则忽略状态会被继承
pub fn restore_default_signals() {
    set_handler(SigHandler::SigDfl);
}

fn set_handler(handler: SigHandler) {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: SigIgn / SigDfl 不涉及自定义处理函数
        if let Err(e) = unsafe { signal(sig, handler) } {
            warn!("无法设置信号 {} 的处理方式: {}", sig, e);
        }
    }
}
