use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::errors::SubtitleError;

// @module: Subtitle formatting, serialization and parsing

// @const: SRT time range regex (hours may exceed two digits)
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("static timestamp regex is valid")
});

// @const: Single SRT timestamp regex
static SINGLE_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})$")
        .expect("static timestamp regex is valid")
});

/// A transcript unit as produced by the transcription service.
///
/// Times are offsets in seconds from the start of the media. The text is
/// carried verbatim and may be empty or span several lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TimedSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        TimedSegment {
            start,
            end,
            text: text.into(),
        }
    }
}

// @const: Distance, in ULPs of the scaled value, treated as float error
const MILLIS_ULP_TOLERANCE: f64 = 8.0;

/// Convert an offset in seconds to whole milliseconds, truncating.
///
/// A product that lands a few ULPs below the next millisecond is counted
/// as that millisecond: 3661.234 is stored as 3661.23399999... and must
/// still give 3661234. Anything further below is truncated, so 0.9999995
/// gives 999. Offsets whose millisecond count does not fit in a `u64` are
/// rejected.
pub fn seconds_to_millis(seconds: f64) -> Result<u64, SubtitleError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SubtitleError::InvalidTime(seconds));
    }

    let scaled = seconds * 1000.0;
    if scaled >= u64::MAX as f64 {
        return Err(SubtitleError::InvalidTime(seconds));
    }

    let truncated = scaled.trunc();
    let next = truncated + 1.0;
    let tolerance = scaled.max(1.0) * MILLIS_ULP_TOLERANCE * f64::EPSILON;
    let millis = if next - scaled <= tolerance { next } else { truncated };

    Ok(millis as u64)
}

/// Format an offset in seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Hours are padded to two digits but never truncated, so offsets past
/// 99 hours render as `100:00:00,000` and up.
pub fn format_time(seconds: f64) -> Result<String, SubtitleError> {
    seconds_to_millis(seconds).map(SubtitleEntry::format_timestamp)
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`, `.` also accepted) into seconds
pub fn parse_timestamp(timestamp: &str) -> Result<f64, SubtitleError> {
    let caps = SINGLE_TIMESTAMP_REGEX
        .captures(timestamp.trim())
        .ok_or_else(|| SubtitleError::Parse(format!("Invalid timestamp format: {}", timestamp)))?;

    let ms = SubtitleDocument::parse_timestamp_to_ms(&caps, 1)?;
    Ok(ms as f64 / 1000.0)
}

/// Serialize an ordered sequence of segments into SRT text.
///
/// Every record is followed by one blank line, the last one included.
/// An empty sequence yields an empty string.
pub fn serialize(segments: &[TimedSegment]) -> Result<String, SubtitleError> {
    Ok(SubtitleDocument::from_segments(segments)?.to_string())
}

/// Serialize segments and write them to `destination`
pub fn write_srt<P: AsRef<Path>>(segments: &[TimedSegment], destination: P) -> Result<PathBuf> {
    SubtitleDocument::from_segments(segments)?.write_to_srt(destination)
}

// @struct: Single subtitle record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: 1-based sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, verbatim
    pub text: String,
}

impl SubtitleEntry {
    // @creates: Entry from a transcript segment at the given position
    // @validates: Non-negative times, end not before start
    pub fn from_segment(seq_num: usize, segment: &TimedSegment) -> Result<Self, SubtitleError> {
        if segment.end < segment.start {
            return Err(SubtitleError::InvertedRange {
                index: seq_num,
                start: segment.start,
                end: segment.end,
            });
        }

        Ok(SubtitleEntry {
            seq_num,
            start_time_ms: seconds_to_millis(segment.start)?,
            end_time_ms: seconds_to_millis(segment.end)?,
            text: segment.text.clone(),
        })
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// An SRT document: records numbered 1..N in source order.
///
/// Built once from a transcript and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtitleDocument {
    entries: Vec<SubtitleEntry>,
}

impl SubtitleDocument {
    /// Build a document from transcript segments, numbering them by position
    pub fn from_segments(segments: &[TimedSegment]) -> Result<Self, SubtitleError> {
        let entries = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| SubtitleEntry::from_segment(i + 1, segment))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SubtitleDocument { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the document to an SRT file, creating parent directories
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        write!(file, "{}", self)
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;
        file.flush()?;

        debug!("Wrote {} subtitle entries to {}", self.entries.len(), path.display());
        Ok(path.to_path_buf())
    }

    /// Parse SRT text into timed segments, in document order.
    ///
    /// Records without a valid time line are skipped with a warning.
    /// Empty content yields no segments; non-empty content with no valid
    /// record is an error.
    pub fn parse_srt_string(content: &str) -> Result<Vec<TimedSegment>, SubtitleError> {
        let mut segments = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_times: Option<(u64, u64)> = None;
        let mut current_text: Vec<&str> = Vec::new();

        for (line_idx, raw_line) in content.lines().enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let trimmed = line.trim();

            // A blank line closes the current record
            if trimmed.is_empty() {
                if let Some((start_ms, end_ms)) = current_times.take() {
                    segments.push(TimedSegment {
                        start: start_ms as f64 / 1000.0,
                        end: end_ms as f64 / 1000.0,
                        text: current_text.join("\n"),
                    });
                } else if let Some(seq_num) = current_seq_num {
                    warn!("Skipping subtitle entry {} without a time line", seq_num);
                }
                current_seq_num = None;
                current_text.clear();
                continue;
            }

            if current_seq_num.is_none() {
                match trimmed.trim_start_matches('\u{feff}').parse::<usize>() {
                    Ok(num) => current_seq_num = Some(num),
                    Err(_) => warn!("Unexpected text at line {} before sequence number: {}", line_idx + 1, trimmed),
                }
                continue;
            }

            if current_times.is_none() {
                let parsed = TIMESTAMP_REGEX.captures(trimmed).map(|caps| {
                    Ok::<_, SubtitleError>((
                        Self::parse_timestamp_to_ms(&caps, 1)?,
                        Self::parse_timestamp_to_ms(&caps, 5)?,
                    ))
                });
                match parsed {
                    Some(Ok(times)) => current_times = Some(times),
                    Some(Err(e)) => warn!("Invalid timestamp at line {}: {}", line_idx + 1, e),
                    None => warn!("Invalid timestamp format at line {}: {}", line_idx + 1, trimmed),
                }
                continue;
            }

            current_text.push(line);
        }

        // Add the last entry if there is one
        if let Some((start_ms, end_ms)) = current_times {
            segments.push(TimedSegment {
                start: start_ms as f64 / 1000.0,
                end: end_ms as f64 / 1000.0,
                text: current_text.join("\n"),
            });
        }

        if segments.is_empty() && !content.trim().is_empty() {
            return Err(SubtitleError::Parse(
                "No valid subtitle entries were found in the SRT content".to_string(),
            ));
        }

        Ok(segments)
    }

    /// Parse four capture groups starting at `start_idx` into milliseconds
    fn parse_timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> Result<u64, SubtitleError> {
        let field = |offset: usize| -> Result<u64, SubtitleError> {
            caps.get(start_idx + offset)
                .ok_or_else(|| SubtitleError::Parse("Missing timestamp field".to_string()))?
                .as_str()
                .parse::<u64>()
                .map_err(|e| SubtitleError::Parse(format!("Invalid timestamp field: {}", e)))
        };

        let hours = field(0)?;
        let minutes = field(1)?;
        let seconds = field(2)?;
        let millis = field(3)?;

        if minutes >= 60 || seconds >= 60 {
            return Err(SubtitleError::Parse(format!(
                "Invalid time components: {:02}:{:02}:{:02},{:03}",
                hours, minutes, seconds, millis
            )));
        }

        hours
            .checked_mul(3600)
            .and_then(|s| s.checked_add(minutes * 60 + seconds))
            .and_then(|s| s.checked_mul(1000))
            .and_then(|ms| ms.checked_add(millis))
            .ok_or_else(|| SubtitleError::Parse(format!("Timestamp out of range: {} hours", hours)))
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
