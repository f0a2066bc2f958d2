// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Raw mode against a real pseudo-terminal.
//
// Lives in its own test binary: the original settings may be captured only
// once per process, so everything that enables raw mode happens in the single
// test below.
#![cfg(unix)]

use std::ffi::CStr;
use std::time::Duration;

use kilo_term::Error;
use kilo_term::terminal::{RawMode, TermConfig};
use pretty_assertions::assert_eq;

/// A pseudo-terminal pair. Both ends close on drop.
struct Pty {
    master: libc::c_int,
    slave: libc::c_int,
}

impl Pty {
    fn open() -> Self {
        unsafe {
            let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(master >= 0, "posix_openpt failed");
            assert_eq!(libc::grantpt(master), 0, "grantpt failed");
            assert_eq!(libc::unlockpt(master), 0, "unlockpt failed");

            let name = libc::ptsname(master);
            assert!(!name.is_null(), "ptsname failed");
            let name = CStr::from_ptr(name).to_owned();

            let slave = libc::open(name.as_ptr(), libc::O_RDWR | libc::O_NOCTTY);
            assert!(slave >= 0, "open slave failed");
            Self { master, slave }
        }
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.slave);
            libc::close(self.master);
        }
    }
}

#[test]
fn enable_disable_round_trip_on_pty() {
    let pty = Pty::open();
    let before = TermConfig::read(pty.slave).unwrap();

    // ── Enable ──────────────────────────────────────────────────────
    let raw = RawMode::enable(pty.slave, Duration::from_millis(200)).unwrap();
    assert_eq!(raw.fd(), pty.slave);

    let during = TermConfig::read(pty.slave).unwrap();
    assert!(!during.same_settings(&before));
    assert_eq!(during.local_flags() & (libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN), 0);
    assert_eq!(during.input_flags() & (libc::IXON | libc::ICRNL), 0);
    assert_eq!(during.output_flags() & libc::OPOST, 0);
    assert_eq!(during.vmin(), 0);
    assert_eq!(during.vtime(), 2);

    // ── Disable ─────────────────────────────────────────────────────
    raw.disable().unwrap();
    let after = TermConfig::read(pty.slave).unwrap();
    assert!(after.same_settings(&before), "{before:?} != {after:?}");

    // ── Second capture is refused ───────────────────────────────────
    assert!(matches!(
        RawMode::enable(pty.slave, Duration::from_millis(100)),
        Err(Error::AlreadyCaptured)
    ));
    let untouched = TermConfig::read(pty.slave).unwrap();
    assert!(untouched.same_settings(&before));
}
