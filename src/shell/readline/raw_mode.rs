use std::os::fd::{AsFd, BorrowedFd};

use log::warn;
use nix::sys::termios::{
    tcgetattr, tcsetattr, ControlFlags, InputFlags, LocalFlags, SetArg,
    SpecialCharacterIndices as S, Termios,
};

/// 原始输入模式。Drop 时恢复进入前的终端属性。
///
/// Output post-processing (`OPOST`) stays on so `\n` still becomes `\r\n`.
pub struct RawMode<'fd> {
    fd: BorrowedFd<'fd>,
    original: Termios,
}

impl<'fd> RawMode<'fd> {
    pub fn enable(fd: BorrowedFd<'fd>) -> nix::Result<Self> {
        let original = tcgetattr(fd)?;

        let mut raw = original.clone();
        raw.input_flags &= !(InputFlags::BRKINT
            | InputFlags::ICRNL
            | InputFlags::INPCK
            | InputFlags::ISTRIP
            | InputFlags::IXON);
        raw.control_flags |= ControlFlags::CS8;
        raw.local_flags &=
            !(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);
        raw.control_chars[S::VMIN as usize] = 1;
        raw.control_chars[S::VTIME as usize] = 0;
        tcsetattr(fd, SetArg::TCSAFLUSH, &raw)?;

        Ok(Self { fd, original })
    }
}

impl Drop for RawMode<'_> {
    fn drop(&mut self) {
        if let Err(e) = tcsetattr(self.fd.as_fd(), SetArg::TCSAFLUSH, &self.original) {
            warn!("恢复终端属性失败: {}", e);
        }
    }
}
