// Doorbell for hosted channels: a producer rings after publishing, a consumer
// that would otherwise spin can sleep on it. The queue protocol never depends
// on it; a missed or spurious wake only costs one extra poll.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Bump the doorbell word and wake one waiter.
pub fn ring(word: &AtomicU32) {
    word.fetch_add(1, Ordering::Release);
    #[cfg(target_os = "linux")]
    futex(word, libc::FUTEX_WAKE, 1, None);
}

/// Sleep while the doorbell still reads `seen`, for at most `timeout`.
pub fn wait(word: &AtomicU32, seen: u32, timeout: Duration) {
    if word.load(Ordering::Acquire) != seen {
        return;
    }

    #[cfg(target_os = "linux")]
    {
        let ts = libc::timespec {
            tv_sec: timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
            tv_nsec: timeout.subsec_nanos() as libc::c_long,
        };
        futex(word, libc::FUTEX_WAIT, seen, Some(&ts));
    }

    // No futex: a short nap bounded by the timeout
    #[cfg(not(target_os = "linux"))]
    std::thread::sleep(timeout.min(Duration::from_millis(1)));
}

// No FUTEX_PRIVATE_FLAG: the word lives in a MAP_SHARED mapping and the
// waiter is usually in another process. EINTR, EAGAIN and ETIMEDOUT all mean
// "poll again", so the result is ignored.
#[cfg(target_os = "linux")]
fn futex(word: &AtomicU32, op: libc::c_int, val: u32, timeout: Option<&libc::timespec>) {
    let timeout = timeout.map_or(std::ptr::null(), |ts| ts as *const libc::timespec);
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            op,
            val,
            timeout,
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}
