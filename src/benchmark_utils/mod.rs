use crate::error::{Result, SweepError};

/// Renders a float the way the benchmark flags and the summary tables expect it:
/// shortest round-tripping form, always with a fractional part (`0.6`, `1.0`, `2.0`).
pub fn format_decimal(value: f64) -> String {
    format!("{:?}", value)
}

/// Pins the current process (and every child it spawns afterwards) to a single core.
#[cfg(target_os = "linux")]
pub fn set_affinity(core_id: usize) -> Result<()> {
    if core_id >= libc::CPU_SETSIZE as usize {
        return Err(SweepError::invalid_config(
            "core_id",
            format!("{} exceeds the cpu set size {}", core_id, libc::CPU_SETSIZE),
        ));
    }

    // SAFETY: cpu_set_t is plain data; the index was bounds-checked above.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core_id, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };

    if rc != 0 {
        return Err(SweepError::Affinity {
            core_id,
            message: std::io::Error::last_os_error().to_string(),
        });
    }

    log::info!("pinned sweep driver to core {}", core_id);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn set_affinity(core_id: usize) -> Result<()> {
    log::warn!("cpu pinning is only supported on linux, ignoring core {}", core_id);
    Ok(())
}
