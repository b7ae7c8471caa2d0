//! Feature-gated ring logger for the audio thread.
//!
//! `scorch_log!` formats into a fixed-size entry and pushes it onto a
//! single-producer/single-consumer ring; `drain_to_file` empties the ring
//! outside the sample loop. Without the `debug` feature the macro compiles
//! to nothing.

use std::fmt;

#[cfg(feature = "debug")]
pub mod logger {
    use std::cell::UnsafeCell;
    use std::fmt::{self, Write as _};
    use std::fs::OpenOptions;
    use std::io::Write as _;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::OnceLock;

    const RING_CAP: usize = 128;
    const ENTRY_BYTES: usize = 256;
    const LOG_PATH: &str = "/tmp/scorch.log";

    /// One formatted line, truncated to `ENTRY_BYTES`.
    #[derive(Clone, Copy)]
    struct Entry {
        len: usize,
        bytes: [u8; ENTRY_BYTES],
    }

    impl Entry {
        const EMPTY: Entry = Entry {
            len: 0,
            bytes: [0; ENTRY_BYTES],
        };

        fn as_str(&self) -> &str {
            // Truncation may split a code point; keep the valid prefix.
            match std::str::from_utf8(&self.bytes[..self.len]) {
                Ok(s) => s,
                Err(e) => std::str::from_utf8(&self.bytes[..e.valid_up_to()]).unwrap_or(""),
            }
        }
    }

    impl fmt::Write for Entry {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let n = s.len().min(ENTRY_BYTES - self.len);
            self.bytes[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
            self.len += n;
            Ok(())
        }
    }

    struct Ring {
        write: AtomicUsize,
        read: AtomicUsize,
        slots: Box<[UnsafeCell<Entry>]>,
    }

    // One producer (audio thread) and one consumer (drain); slot ownership
    // is handed over through the acquire/release indices.
    unsafe impl Sync for Ring {}

    impl Ring {
        fn new() -> Self {
            Self {
                write: AtomicUsize::new(0),
                read: AtomicUsize::new(0),
                slots: (0..RING_CAP).map(|_| UnsafeCell::new(Entry::EMPTY)).collect(),
            }
        }

        /// Drops the entry when the ring is full.
        fn push(&self, entry: &Entry) {
            let write = self.write.load(Ordering::Relaxed);
            let next = (write + 1) % RING_CAP;
            if next == self.read.load(Ordering::Acquire) {
                return;
            }
            unsafe { *self.slots[write].get() = *entry };
            self.write.store(next, Ordering::Release);
        }

        fn pop(&self) -> Option<Entry> {
            let read = self.read.load(Ordering::Relaxed);
            if read == self.write.load(Ordering::Acquire) {
                return None;
            }
            let entry = unsafe { *self.slots[read].get() };
            self.read.store((read + 1) % RING_CAP, Ordering::Release);
            Some(entry)
        }
    }

    static RING: OnceLock<Ring> = OnceLock::new();
    static ENABLED: AtomicBool = AtomicBool::new(false);

    pub fn init_logger() {
        RING.get_or_init(Ring::new);
        ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn log_args(args: fmt::Arguments) {
        if !ENABLED.load(Ordering::Relaxed) {
            return;
        }
        if let Some(ring) = RING.get() {
            let mut entry = Entry::EMPTY;
            let _ = entry.write_fmt(args);
            ring.push(&entry);
        }
    }

    pub fn drain_to_file() {
        let Some(ring) = RING.get() else {
            return;
        };
        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(LOG_PATH) else {
            return;
        };
        while let Some(entry) = ring.pop() {
            if entry.len > 0 {
                let _ = writeln!(file, "[scorch] {}", entry.as_str());
            }
        }
    }
}

#[cfg(feature = "debug")]
pub(crate) fn scorch_log_inner(args: fmt::Arguments) {
    logger::log_args(args);
}

#[cfg(not(feature = "debug"))]
pub(crate) fn scorch_log_inner(_args: fmt::Arguments) {}

#[macro_export]
macro_rules! scorch_log {
    ($($arg:tt)*) => {
        $crate::debug::scorch_log_inner(format_args!($($arg)*))
    };
}
