//! Memory analysis output parsing.
//!
//! Both parsers classify tool output into leak and error findings. Each leak
//! marker gets its provenance from the first user frame found within the
//! next `LOOKAHEAD` lines; when none is found the record is still emitted
//! with file `unknown` and line 0. Exit code and raw output are always kept.

use crate::models::diagnostic::{LeakRecord, MemoryReport};
use regex::Regex;
use std::sync::LazyLock;

/// Lines scanned after a leak marker when looking for a `file:line` frame.
pub const LOOKAHEAD: usize = 10;

pub trait MemoryOutputParser: Send + Sync {
    fn parse(&self, output: &str, exit_code: i32) -> MemoryReport;
}

static PID_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^==\d+==\s?").unwrap());

static VG_LEAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([\d,]+) (?:\([\d,]+ direct, [\d,]+ indirect\) )?bytes in ([\d,]+) blocks? are (definitely|possibly) lost",
    )
    .unwrap()
});

static VG_SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"definitely lost: ([\d,]+) bytes in ([\d,]+) blocks").unwrap());

static VG_FRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^():\s]+):(\d+)\)").unwrap());

static SAN_LEAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Direct|Indirect) leak of (\d+) byte\(s\) in (\d+) object\(s\)").unwrap()
});

static SAN_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"SUMMARY: AddressSanitizer: (\d+) byte\(s\) leaked in (\d+) allocation\(s\)").unwrap()
});

static SAN_FRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\d+\s+0x[0-9a-fA-F]+\s+in\s+\S+\s+(\S+?):(\d+)(?::\d+)?\s*$").unwrap()
});

const VG_ERROR_MARKERS: &[&str] = &[
    "Invalid read of size",
    "Invalid write of size",
    "Invalid free()",
    "Mismatched free()",
    "Conditional jump or move depends on uninitialised value",
    "Use of uninitialised value",
    "Syscall param",
    "Source and destination overlap",
    "Process terminating with default action of signal",
];

const VG_INTERNAL_FILES: &[&str] = &["vg_replace_", "vgpreload"];
const SAN_INTERNAL_FILES: &[&str] = &["asan_", "lsan_", "sanitizer_common", "compiler-rt", "libsanitizer"];

fn strip_pid(line: &str) -> &str {
    match PID_PREFIX_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

fn parse_count(s: &str) -> u64 {
    s.replace(',', "").parse().unwrap_or(0)
}

/// Find the first user frame after `idx` within the lookahead window.
fn lookahead_frame(
    lines: &[&str],
    idx: usize,
    frame_re: &Regex,
    leak_re: &Regex,
    internal: &[&str],
) -> Option<(String, u32)> {
    let end = (idx + 1 + LOOKAHEAD).min(lines.len());
    for line in &lines[idx + 1..end] {
        if leak_re.is_match(line) {
            break;
        }
        if let Some(cap) = frame_re.captures(line) {
            let file = &cap[1];
            if internal.iter().any(|i| file.contains(i)) {
                continue;
            }
            if let Ok(n) = cap[2].parse::<u32>() {
                return Some((file.to_string(), n));
            }
        }
    }
    None
}

fn leak_record(provenance: Option<(String, u32)>, bytes: u64, description: String) -> LeakRecord {
    let (file, line) = provenance.unwrap_or_else(|| ("unknown".to_string(), 0));
    LeakRecord {
        file,
        line,
        bytes,
        description,
    }
}

/// Parser for Valgrind memcheck output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValgrindParser;

impl MemoryOutputParser for ValgrindParser {
    fn parse(&self, output: &str, exit_code: i32) -> MemoryReport {
        let lines: Vec<&str> = output.lines().collect();
        let mut report = MemoryReport {
            raw_output: output.to_string(),
            exit_code,
            ..Default::default()
        };
        let mut summary_bytes: Option<(u64, u64)> = None;

        for (i, raw) in lines.iter().enumerate() {
            let line = strip_pid(raw);
            if let Some(cap) = VG_LEAK_RE.captures(line) {
                let bytes = parse_count(&cap[1]);
                let description = line
                    .split(" in loss record")
                    .next()
                    .unwrap_or(line)
                    .trim()
                    .to_string();
                let prov = lookahead_frame(&lines, i, &VG_FRAME_RE, &VG_LEAK_RE, VG_INTERNAL_FILES);
                report.leaks.push(leak_record(prov, bytes, description));
                continue;
            }
            if let Some(cap) = VG_SUMMARY_RE.captures(line) {
                summary_bytes = Some((parse_count(&cap[1]), parse_count(&cap[2])));
                continue;
            }
            if VG_ERROR_MARKERS.iter().any(|m| line.contains(m)) {
                report.errors.push(line.trim().to_string());
            }
        }

        // Without --leak-check=full only the summary is printed
        if report.leaks.is_empty() {
            if let Some((bytes, blocks)) = summary_bytes.filter(|(b, _)| *b > 0) {
                report.leaks.push(leak_record(
                    None,
                    bytes,
                    format!("{} bytes in {} blocks are definitely lost", bytes, blocks),
                ));
            }
        }
        report.has_leaks = !report.leaks.is_empty();
        report.has_errors = !report.errors.is_empty();
        report
    }
}

/// Parser for AddressSanitizer / LeakSanitizer (and UBSan runtime) output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SanitizerParser;

impl MemoryOutputParser for SanitizerParser {
    fn parse(&self, output: &str, exit_code: i32) -> MemoryReport {
        let lines: Vec<&str> = output.lines().collect();
        let mut report = MemoryReport {
            raw_output: output.to_string(),
            exit_code,
            ..Default::default()
        };
        let mut detected = false;
        let mut summary_bytes: Option<u64> = None;

        for (i, raw) in lines.iter().enumerate() {
            let line = strip_pid(raw);
            if line.contains("ERROR: LeakSanitizer: detected memory leaks") {
                detected = true;
                continue;
            }
            if let Some(cap) = SAN_LEAK_RE.captures(line) {
                let bytes = parse_count(&cap[2]);
                let description = format!("{} leak of {} byte(s) in {} object(s)", &cap[1], bytes, &cap[3]);
                let prov =
                    lookahead_frame(&lines, i, &SAN_FRAME_RE, &SAN_LEAK_RE, SAN_INTERNAL_FILES);
                report.leaks.push(leak_record(prov, bytes, description));
                continue;
            }
            if let Some(cap) = SAN_SUMMARY_RE.captures(line) {
                summary_bytes = Some(parse_count(&cap[1]));
                continue;
            }
            if line.contains("ERROR: AddressSanitizer:") || line.contains("runtime error:") {
                report.errors.push(line.trim().to_string());
            }
        }

        if report.leaks.is_empty() && (detected || summary_bytes.is_some()) {
            let bytes = summary_bytes.unwrap_or(0);
            report
                .leaks
                .push(leak_record(None, bytes, format!("{} byte(s) leaked", bytes)));
        }
        report.has_leaks = !report.leaks.is_empty();
        report.has_errors = !report.errors.is_empty();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VG_LEAK: &str = "\
==4242== Memcheck, a memory error detector
==4242== HEAP SUMMARY:
==4242==     in use at exit: 40 bytes in 1 blocks
==4242==
==4242== 40 bytes in 1 blocks are definitely lost in loss record 1 of 1
==4242==    at 0x483B7F3: malloc (vg_replace_malloc.c:309)
==4242==    by 0x109151: make_list (list.c:12)
==4242==    by 0x109182: main (main.c:7)
==4242==
==4242== LEAK SUMMARY:
==4242==    definitely lost: 40 bytes in 1 blocks
==4242== ERROR SUMMARY: 1 errors from 1 contexts (suppressed: 0 from 0)
";

    #[test]
    fn test_valgrind_leak_with_user_frame() {
        let r = ValgrindParser.parse(VG_LEAK, 42);
        assert!(r.has_leaks);
        assert!(!r.has_errors);
        assert!(!r.is_passed());
        assert_eq!(r.leaks.len(), 1);
        assert_eq!(r.leaks[0].file, "list.c");
        assert_eq!(r.leaks[0].line, 12);
        assert_eq!(r.leaks[0].bytes, 40);
        assert_eq!(r.exit_code, 42);
        assert_eq!(r.raw_output, VG_LEAK);
    }

    #[test]
    fn test_valgrind_leak_without_frame_in_window() {
        let out = "\
==7== 64 bytes in 1 blocks are definitely lost in loss record 1 of 1
==7==    at 0x483B7F3: malloc (vg_replace_malloc.c:309)
==7==    by 0x10914E: ??? (in /tmp/a.out)
==7==
==7==
==7==
==7==
==7==
==7==
==7==
==7==
==7==    by 0x109182: main (main.c:7)
";
        let r = ValgrindParser.parse(out, 0);
        assert_eq!(r.leaks.len(), 1);
        assert_eq!(r.leaks[0].file, "unknown");
        assert_eq!(r.leaks[0].line, 0);
        assert_eq!(r.leaks[0].bytes, 64);
        assert_eq!(r.total_leaked_bytes(), 64);
    }

    #[test]
    fn test_valgrind_frame_on_last_window_line_is_found() {
        let with_frame_at = |offset: usize| {
            let mut out = String::from("==7== 32 bytes in 1 blocks are definitely lost\n");
            for _ in 1..offset {
                out.push_str("==7==\n");
            }
            out.push_str("==7==    by 0x109182: main (list.c:21)\n");
            ValgrindParser.parse(&out, 0)
        };
        let inside = with_frame_at(LOOKAHEAD);
        assert_eq!(inside.leaks[0].file, "list.c");
        assert_eq!(inside.leaks[0].line, 21);
        let outside = with_frame_at(LOOKAHEAD + 1);
        assert_eq!(outside.leaks[0].file, "unknown");
    }

    #[test]
    fn test_valgrind_invalid_access_and_summary_only_leak() {
        let out = "\
==9== Invalid write of size 4
==9==    at 0x109160: main (main.c:6)
==9==  Address 0x4a4b068 is 0 bytes after a block of size 40 alloc'd
==9== LEAK SUMMARY:
==9==    definitely lost: 1,024 bytes in 2 blocks
";
        let r = ValgrindParser.parse(out, 1);
        assert!(r.has_errors);
        assert_eq!(r.errors, vec!["Invalid write of size 4".to_string()]);
        assert!(r.has_leaks);
        assert_eq!(r.leaks[0].bytes, 1024);
        assert_eq!(r.leaks[0].file, "unknown");
    }

    #[test]
    fn test_valgrind_clean_run_passes() {
        let out = "\
==3== All heap blocks were freed -- no leaks are possible
==3== ERROR SUMMARY: 0 errors from 0 contexts (suppressed: 0 from 0)
";
        let r = ValgrindParser.parse(out, 0);
        assert!(r.is_passed());
        assert!(r.leaks.is_empty());
    }

    #[test]
    fn test_sanitizer_leaks_and_error() {
        let out = "\
=================================================================
==1234==ERROR: LeakSanitizer: detected memory leaks

Direct leak of 32 byte(s) in 1 object(s) allocated from:
    #0 0x7f3c in malloc ../../../../src/libsanitizer/asan/asan_malloc_linux.cpp:69
    #1 0x4011a6 in main /work/sub/main.c:5:17
    #2 0x7f3b in __libc_start_main (/lib/x86_64-linux-gnu/libc.so.6+0x29d90)

Indirect leak of 8 byte(s) in 1 object(s) allocated from:
    #0 0x7f3c in malloc (/lib/x86_64-linux-gnu/libasan.so.6+0xb0a3f)

SUMMARY: AddressSanitizer: 40 byte(s) leaked in 2 allocation(s).
";
        let r = SanitizerParser.parse(out, 1);
        assert!(r.has_leaks);
        assert_eq!(r.leaks.len(), 2);
        assert_eq!(r.leaks[0].file, "/work/sub/main.c");
        assert_eq!(r.leaks[0].line, 5);
        assert_eq!(r.leaks[1].file, "unknown");
        assert_eq!(r.total_leaked_bytes(), 40);
        assert!(!r.has_errors);

        let overflow = "==5==ERROR: AddressSanitizer: heap-buffer-overflow on address 0x602000000014\n";
        let e = SanitizerParser.parse(overflow, 1);
        assert!(e.has_errors);
        assert!(!e.has_leaks);
        assert!(e.errors[0].starts_with("ERROR: AddressSanitizer: heap-buffer-overflow"));
    }
}
