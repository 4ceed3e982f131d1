// thread placement for writer/reader threads

use crate::error::CpuAffinityError;

// glibc CPU_SETSIZE
#[cfg(target_os = "linux")]
const CPU_SETSIZE: usize = 1024;

// pin the calling thread to a single cpu
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpu: usize) -> Result<(), CpuAffinityError> {
    let max = max_cpu_id()?.min(CPU_SETSIZE - 1);
    if cpu > max {
        return Err(CpuAffinityError::InvalidCpu { cpu, max });
    }

    // safety: cpu_set_t is plain data, all-zero is the empty set
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // safety: cpu < CPU_SETSIZE checked above
    unsafe { libc::CPU_SET(cpu, &mut set) };

    // safety: pid 0 is the calling thread, set is a valid cpu_set_t of the given size
    let rc = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    log::debug!("pinned thread {:?} to cpu {}", std::thread::current().name(), cpu);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_cpu: usize) -> Result<(), CpuAffinityError> {
    Err(CpuAffinityError::NotSupported)
}

// highest online cpu id
#[cfg(target_os = "linux")]
pub fn max_cpu_id() -> Result<usize, CpuAffinityError> {
    // sysfs reports "0-N" or "0"
    if let Ok(online) = std::fs::read_to_string("/sys/devices/system/cpu/online") {
        let last = online.trim().rsplit(['-', ',']).next().unwrap_or("");
        if let Ok(max) = last.parse::<usize>() {
            return Ok(max);
        }
    }

    // safety: sysconf has no preconditions
    let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if count <= 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok((count as usize).saturating_sub(1))
}

#[cfg(not(target_os = "linux"))]
pub fn max_cpu_id() -> Result<usize, CpuAffinityError> {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .map_err(CpuAffinityError::Io)
}

// number of online logical cpus
pub fn cpu_count() -> Result<usize, CpuAffinityError> {
    Ok(max_cpu_id()?.saturating_add(1))
}
