//! Offset formatting for card titles.

use std::fmt::Write;

/// Render a millisecond offset as `1d2h3m4s5ms`, dropping zero units.
pub fn format_duration_ms(ms: i64) -> String {
    let abs = ms.unsigned_abs();
    if abs == 0 {
        return "0ms".to_string();
    }

    let units = [
        ("d", abs / 86_400_000),
        ("h", abs / 3_600_000 % 24),
        ("m", abs / 60_000 % 60),
        ("s", abs / 1_000 % 60),
        ("ms", abs % 1_000),
    ];

    let mut out = String::new();
    if ms < 0 {
        out.push('-');
    }
    for (unit, value) in units {
        if value > 0 {
            let _ = write!(out, "{value}{unit}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_common_offsets() {
        struct Case {
            input: i64,
            expected: &'static str,
        }

        let cases = [
            Case {
                input: 0,
                expected: "0ms",
            },
            Case {
                input: 42,
                expected: "42ms",
            },
            Case {
                input: 1_500,
                expected: "1s500ms",
            },
            Case {
                input: 60_000,
                expected: "1m",
            },
            Case {
                input: 90_061_001,
                expected: "1d1h1m1s1ms",
            },
            Case {
                input: -1_250,
                expected: "-1s250ms",
            },
        ];

        for case in cases {
            assert_eq!(format_duration_ms(case.input), case.expected);
        }
    }
}
