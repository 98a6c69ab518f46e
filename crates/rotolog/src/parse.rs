//! Reading formatted records back into their fields

use crate::clock::Timestamp;
use crate::error::{Error, Result};
use crate::format::THREAD_ID_WIDTH;
use crate::level::Level;

/// Fields of one record line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord<'a> {
    /// Wall-clock time of the record
    pub timestamp: Timestamp,
    /// Thread id as written (low 48 bits)
    pub thread_id: u64,
    /// Severity
    pub level: Level,
    /// Calling function
    pub function: &'a str,
    /// Source file name
    pub file: &'a str,
    /// Source line
    pub line: u32,
    /// Message text
    pub message: &'a str,
}

impl<'a> ParsedRecord<'a> {
    /// Parse one record; a single trailing newline is accepted.
    ///
    /// The function name may not contain `]@(` and the file name may not
    /// contain `,`; everything after `) ` is the message.
    pub fn parse(line: &'a str) -> Result<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);

        let rest = line
            .strip_prefix('[')
            .ok_or(Error::MalformedRecord("timestamp"))?;
        let (stamp, rest) = rest
            .split_once("][")
            .ok_or(Error::MalformedRecord("timestamp"))?;
        let timestamp = parse_timestamp(stamp)?;

        let (thread_id, rest) = rest
            .split_once("][")
            .ok_or(Error::MalformedRecord("thread id"))?;
        if thread_id.len() != THREAD_ID_WIDTH {
            return Err(Error::MalformedRecord("thread id"));
        }
        let thread_id =
            u64::from_str_radix(thread_id, 16).map_err(|_| Error::MalformedRecord("thread id"))?;

        let (level, rest) = rest
            .split_once("][")
            .ok_or(Error::MalformedRecord("level"))?;
        let level = Level::from_tag(level).ok_or(Error::MalformedRecord("level"))?;

        let (function, rest) = rest
            .split_once("]@(")
            .ok_or(Error::MalformedRecord("function"))?;

        let (location, message) = rest
            .split_once(") ")
            .ok_or(Error::MalformedRecord("location"))?;
        let (file, line_number) = location
            .rsplit_once(',')
            .ok_or(Error::MalformedRecord("location"))?;
        let line_number = line_number
            .parse()
            .map_err(|_| Error::MalformedRecord("line"))?;

        Ok(Self {
            timestamp,
            thread_id,
            level,
            function,
            file,
            line: line_number,
            message,
        })
    }
}

/// `YYYY-MM-DD HH:MM:SS`
fn parse_timestamp(s: &str) -> Result<Timestamp> {
    let bytes = s.as_bytes();
    if bytes.len() != 19
        || bytes[4] != b'-'
        || bytes[7] != b'-'
        || bytes[10] != b' '
        || bytes[13] != b':'
        || bytes[16] != b':'
    {
        return Err(Error::MalformedRecord("timestamp"));
    }

    let field = |range: std::ops::Range<usize>| -> Result<u16> {
        let digits = &s[range];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedRecord("timestamp"));
        }
        digits
            .parse()
            .map_err(|_| Error::MalformedRecord("timestamp"))
    };

    Ok(Timestamp {
        year: field(0..4)?,
        month: field(5..7)? as u8,
        day: field(8..10)? as u8,
        hour: field(11..13)? as u8,
        minute: field(14..16)? as u8,
        second: field(17..19)? as u8,
    })
}
