use std::sync::{Mutex, OnceLock};
use sysinfo::{Pid, ProcessExt, System, SystemExt};

/// Cached process-memory sampler. `System` is expensive to build, so one
/// instance is kept and only this process is refreshed per sample.
struct MemState {
    sys: System,
    pid: Option<Pid>,
}

static STATE: OnceLock<Mutex<MemState>> = OnceLock::new();

fn with_state<F, T>(f: F) -> T
where
    F: FnOnce(&mut MemState) -> T,
{
    let m = STATE.get_or_init(|| {
        Mutex::new(MemState { sys: System::new(), pid: sysinfo::get_current_pid().ok() })
    });
    let mut guard = m.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}

/// Resident set size of the current process in bytes, if the platform reports it.
pub fn process_rss_bytes() -> Option<u64> {
    with_state(|st| {
        let pid = st.pid?;
        if !st.sys.refresh_process(pid) {
            return None;
        }
        st.sys.process(pid).map(|p| p.memory())
    })
}
