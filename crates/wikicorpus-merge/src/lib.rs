//! Two-way sorted merge of `count<TAB>key` files.
//!
//! Both inputs must already be sorted ascending by key with unique keys.
//! Keys present in both inputs have their counts summed; keys present in
//! only one are passed through. Malformed lines are skipped with a warning
//! rather than aborting the merge, matching the original's `readCount` loop.

use std::io::{self, BufRead, Lines, Write};

use wikicorpus_util::{format_count_line, parse_count_line};

#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error("I/O error during merge: {0}")]
    Io(#[from] io::Error),
}

pub type MergeResult<T> = Result<T, MergeError>;

/// Reads records until the next one parses successfully, or the input is
/// exhausted. Unparseable lines are logged and skipped, per spec §7's
/// "record parse warning" policy.
fn next_record<R: BufRead>(lines: &mut Lines<R>) -> io::Result<Option<(u64, String)>> {
    for line in lines {
        let line = line?;
        match parse_count_line(&line) {
            Some((count, key)) => return Ok(Some((count, key.to_string()))),
            None => {
                tracing::warn!(%line, "could not parse count record, skipping");
            }
        }
    }
    Ok(None)
}

/// Merges `src1` and `src2` into `out`, writing `count<TAB>key` lines in
/// ascending key order with counts summed on key collision. Returns the sum
/// of all counts written.
pub fn merge_counts<R1: BufRead, R2: BufRead, W: Write>(
    src1: R1,
    src2: R2,
    mut out: W,
) -> MergeResult<u64> {
    let mut lines1 = src1.lines();
    let mut lines2 = src2.lines();

    let mut rec1 = next_record(&mut lines1)?;
    let mut rec2 = next_record(&mut lines2)?;

    let mut total: u64 = 0;

    loop {
        match (&rec1, &rec2) {
            (Some((c1, k1)), Some((c2, k2))) => match k1.cmp(k2) {
                std::cmp::Ordering::Equal => {
                    let sum = c1 + c2;
                    out.write_all(format_count_line(sum, k1).as_bytes())?;
                    total += sum;
                    rec1 = next_record(&mut lines1)?;
                    rec2 = next_record(&mut lines2)?;
                }
                std::cmp::Ordering::Less => {
                    out.write_all(format_count_line(*c1, k1).as_bytes())?;
                    total += c1;
                    rec1 = next_record(&mut lines1)?;
                }
                std::cmp::Ordering::Greater => {
                    out.write_all(format_count_line(*c2, k2).as_bytes())?;
                    total += c2;
                    rec2 = next_record(&mut lines2)?;
                }
            },
            (Some((c1, k1)), None) => {
                out.write_all(format_count_line(*c1, k1).as_bytes())?;
                total += c1;
                rec1 = next_record(&mut lines1)?;
            }
            (None, Some((c2, k2))) => {
                out.write_all(format_count_line(*c2, k2).as_bytes())?;
                total += c2;
                rec2 = next_record(&mut lines2)?;
            }
            (None, None) => break,
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(a: &str, b: &str) -> (String, u64) {
        let mut out = Vec::new();
        let total = merge_counts(Cursor::new(a), Cursor::new(b), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), total)
    }

    #[test]
    fn sums_shared_keys() {
        let (out, total) = run("2\ta\n3\tb\n", "1\ta\n4\tc\n");
        assert_eq!(out, "3\ta\n3\tb\n4\tc\n");
        assert_eq!(total, 10);
    }

    #[test]
    fn passes_through_disjoint_keys() {
        let (out, _) = run("1\ta\n", "1\tb\n");
        assert_eq!(out, "1\ta\n1\tb\n");
    }

    #[test]
    fn is_commutative() {
        let a = "2\ta\n3\tb\n5\td\n";
        let b = "1\ta\n4\tc\n";
        let (out_ab, total_ab) = run(a, b);
        let (out_ba, total_ba) = run(b, a);
        assert_eq!(out_ab, out_ba);
        assert_eq!(total_ab, total_ba);
    }

    #[test]
    fn is_associative_over_three_inputs() {
        let a = "1\ta\n1\tb\n";
        let b = "1\tb\n1\tc\n";
        let c = "1\tc\n1\td\n";

        let (ab, _) = run(a, b);
        let (ab_c, total_1) = run(&ab, c);

        let (bc, _) = run(b, c);
        let (a_bc, total_2) = run(a, &bc);

        assert_eq!(ab_c, a_bc);
        assert_eq!(total_1, total_2);
    }

    #[test]
    fn skips_malformed_lines_with_warning() {
        let (out, total) = run("not a count line\n2\ta\n", "1\ta\n");
        assert_eq!(out, "3\ta\n");
        assert_eq!(total, 3);
    }

    #[test]
    fn handles_empty_inputs() {
        let (out, total) = run("", "");
        assert_eq!(out, "");
        assert_eq!(total, 0);
    }
}
