use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus as WS};
use nix::unistd::Pid;

/// 一个阶段的结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Exited(i32),
    Signaled(i32),
}

impl StageStatus {
    /// Shell-style status code: the exit code, or `128 + signal`.
    pub fn code(&self) -> i32 {
        match *self {
            StageStatus::Exited(code) => code,
            StageStatus::Signaled(sig) => 128 + sig,
        }
    }

    fn from_wait(ws: WS) -> Option<Self> {
        match ws {
            WS::Exited(_, code) => Some(StageStatus::Exited(code)),
            WS::Signaled(_, sig, _core_dumped) => Some(StageStatus::Signaled(sig as i32)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResult {
    pub statuses: Vec<(Pid, StageStatus)>,
    /// 最后一个启动的阶段的状态
    pub status: i32,
}

/// Blocks until every child in `pids` has terminated.
///
/// `status` is taken from the last pid; a pid that cannot be waited for
/// counts as status 1.
pub fn wait_all(pids: &[Pid]) -> PipelineResult {
    let mut result = PipelineResult::default();

    for (index, &pid) in pids.iter().enumerate() {
        let status = wait_one(pid);
        debug!("子进程 {} 结束: {:?}", pid, status);
        let code = status.map_or(1, |s| s.code());
        if let Some(status) = status {
            result.statuses.push((pid, status));
        }
        if index + 1 == pids.len() {
            result.status = code;
        }
    }
    result
}

fn wait_one(pid: Pid) -> Option<StageStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(ws) => {
                if let Some(status) = StageStatus::from_wait(ws) {
                    return Some(status);
                }
                // 停止/继续等状态不算结束，继续等待
            }
            Err(Errno::EINTR) => continue,
            Err(e) => {
                error!("waitpid {} 失败: {}", pid, e);
                return None;
            }
        }
    }
}
