//! Operator Interrupt
//!
//! Ctrl+C while a method is running must stop the whole run, not just the
//! method. The handler only sets an atomic flag; the engine polls it between
//! wait slices and turns it into [`crate::EngineError::Aborted`].

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn sigint_handler(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Shared view of an interrupt flag
#[derive(Debug, Clone, Copy)]
pub struct Interrupt {
    flag: &'static AtomicBool,
}

impl Interrupt {
    /// Install the SIGINT handler and return a handle to the process-wide flag
    pub fn install() -> Self {
        #[cfg(unix)]
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = sigint_handler as *const () as usize;
            sa.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&mut sa.sa_mask);
            libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
        }
        Self::global()
    }

    /// Handle to the process-wide flag without touching signal dispositions
    pub fn global() -> Self {
        Self { flag: &INTERRUPTED }
    }

    /// Handle to a caller-owned flag
    pub fn from_flag(flag: &'static AtomicBool) -> Self {
        Self { flag }
    }

    /// Whether an interrupt was requested
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request an interrupt
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_flag_is_isolated() {
        let flag: &'static AtomicBool = Box::leak(Box::new(AtomicBool::new(false)));
        let interrupt = Interrupt::from_flag(flag);
        assert!(!interrupt.is_set());
        interrupt.trigger();
        assert!(interrupt.is_set());
        assert!(flag.load(Ordering::SeqCst));
    }
}
