//! Fixed-layout record formatting
//!
//! Every record is one line:
//!
//! ```text
//! [YYYY-MM-DD HH:MM:SS][<thread id, 12 hex>][<level, 5>][<function>]@(<file>,<line>) <message>\n
//! ```
//!
//! The exact length is known from the input lengths alone, so the output
//! buffer is sized once and filled in place without intermediate strings.

use crate::clock::Timestamp;
use crate::level::{LEVEL_TAG_WIDTH, Level};
use std::cell::Cell;

/// Number of hex digits used for the thread id
pub const THREAD_ID_WIDTH: usize = 12;

/// Bytes of every record that do not depend on the record's fields
pub const FIXED_WIDTH: usize = PREFIX.len() + SUFFIX_WIDTH;

/// Everything up to the function name, with placeholder digits
const PREFIX: &[u8; 43] = b"[0000-00-00 00:00:00][000000000000][     ][";

/// `]@(`, `,`, `) ` and the trailing newline
const SUFFIX_WIDTH: usize = 3 + 1 + 2 + 1;

const YEAR_AT: usize = 1;
const MONTH_AT: usize = 6;
const DAY_AT: usize = 9;
const HOUR_AT: usize = 12;
const MINUTE_AT: usize = 15;
const SECOND_AT: usize = 18;
const THREAD_ID_AT: usize = 22;
const LEVEL_AT: usize = 36;

const THREAD_ID_MASK: u64 = (1 << (4 * THREAD_ID_WIDTH)) - 1;
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Source location of a logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Name of the calling function
    pub function: &'static str,
    /// Trailing path component of the source file
    pub file: &'static str,
    /// Line number of the call
    pub line: u32,
}

impl CallSite {
    /// Create a call site, reducing `file` to its last path component
    pub fn new(function: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            function,
            file: file_name(file),
            line,
        }
    }
}

/// One record, borrowed from the call site for the duration of a write
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Severity
    pub level: Level,
    /// Name of the calling function
    pub function: &'a str,
    /// Source file name
    pub file: &'a str,
    /// Source line
    pub line: u32,
    /// Message text
    pub message: &'a str,
}

impl<'a> Record<'a> {
    /// Create a record from a call site and message
    #[inline]
    pub fn new(level: Level, site: &CallSite, message: &'a str) -> Self {
        Self {
            level,
            function: site.function,
            file: site.file,
            line: site.line,
            message,
        }
    }

    /// Exact number of bytes [`format_record`] will produce
    #[inline]
    pub fn formatted_len(&self) -> usize {
        FIXED_WIDTH
            + self.function.len()
            + self.file.len()
            + decimal_width(self.line)
            + self.message.len()
    }
}

/// Render `record` into `out`, replacing its previous contents.
///
/// `out` is resized to exactly [`Record::formatted_len`]; once its capacity
/// has grown to fit, repeated calls do not allocate.
pub fn format_record(
    out: &mut Vec<u8>,
    timestamp: &Timestamp,
    thread_id: u64,
    record: &Record<'_>,
) {
    let len = record.formatted_len();
    out.clear();
    out.resize(len, 0);
    let buf = out.as_mut_slice();

    buf[..PREFIX.len()].copy_from_slice(PREFIX);
    write_4(&mut buf[YEAR_AT..], timestamp.year);
    write_2(&mut buf[MONTH_AT..], timestamp.month);
    write_2(&mut buf[DAY_AT..], timestamp.day);
    write_2(&mut buf[HOUR_AT..], timestamp.hour);
    write_2(&mut buf[MINUTE_AT..], timestamp.minute);
    write_2(&mut buf[SECOND_AT..], timestamp.second);
    write_hex(&mut buf[THREAD_ID_AT..THREAD_ID_AT + THREAD_ID_WIDTH], thread_id);
    buf[LEVEL_AT..LEVEL_AT + LEVEL_TAG_WIDTH].copy_from_slice(record.level.as_str().as_bytes());

    let mut pos = PREFIX.len();
    pos = put(buf, pos, record.function.as_bytes());
    pos = put(buf, pos, b"]@(");
    pos = put(buf, pos, record.file.as_bytes());
    pos = put(buf, pos, b",");
    let line_width = decimal_width(record.line);
    write_decimal(&mut buf[pos..pos + line_width], record.line);
    pos += line_width;
    pos = put(buf, pos, b") ");

    let message_at = pos;
    pos = put(buf, pos, record.message.as_bytes());
    // One record is one line.
    for byte in &mut buf[message_at..pos] {
        if *byte == b'\n' || *byte == b'\r' {
            *byte = b' ';
        }
    }
    buf[pos] = b'\n';
    debug_assert_eq!(pos + 1, len);
}

/// Id of the calling thread, cached after the first call.
///
/// On Linux this is the kernel thread id; elsewhere threads are numbered in
/// the order they first log.
pub fn current_thread_id() -> u64 {
    thread_local! {
        static THREAD_ID: Cell<Option<u64>> = const { Cell::new(None) };
    }

    THREAD_ID.with(|cached| match cached.get() {
        Some(id) => id,
        None => {
            let id = os_thread_id();
            cached.set(Some(id));
            id
        }
    })
}

/// Kernel thread id.
///
/// The `gettid` call is the crate's only unsafe code, which is why the crate
/// denies `unsafe_code` rather than forbidding it and allows it here.
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
fn os_thread_id() -> u64 {
    // SAFETY: gettid has no preconditions and cannot fail.
    let tid = unsafe { libc::gettid() };
    tid as u64
}

#[cfg(not(target_os = "linux"))]
fn os_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Last component of a source path, accepting either separator
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Number of decimal digits needed for `n`
#[inline]
pub(crate) const fn decimal_width(n: u32) -> usize {
    match n.checked_ilog10() {
        Some(log) => log as usize + 1,
        None => 1,
    }
}

#[inline]
fn put(buf: &mut [u8], at: usize, bytes: &[u8]) -> usize {
    let end = at + bytes.len();
    buf[at..end].copy_from_slice(bytes);
    end
}

#[inline]
fn write_2(dest: &mut [u8], value: u8) {
    let value = value % 100;
    dest[0] = b'0' + value / 10;
    dest[1] = b'0' + value % 10;
}

#[inline]
fn write_4(dest: &mut [u8], value: u16) {
    let value = value % 10_000;
    write_2(dest, (value / 100) as u8);
    write_2(&mut dest[2..], (value % 100) as u8);
}

/// Zero-padded lowercase hex filling all of `dest`
#[inline]
fn write_hex(dest: &mut [u8], value: u64) {
    let mut value = value & THREAD_ID_MASK;
    for slot in dest.iter_mut().rev() {
        *slot = HEX_DIGITS[(value & 0xf) as usize];
        value >>= 4;
    }
}

/// Decimal digits of `value` filling all of `dest`
#[inline]
fn write_decimal(dest: &mut [u8], mut value: u32) {
    for slot in dest.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}
