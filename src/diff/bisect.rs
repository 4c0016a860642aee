//! Myers' O(ND) middle-snake bisect (component C7): the fallback the diff
//! engine reaches for once the cheap shortcuts and half-match heuristic
//! have all declined to apply.

use crate::buffer::ByteSpan;
use crate::config::BuildConfig;
use crate::diff::fragment::DiffFragment;

/// Find the middle snake of `a`/`b` and recurse on both halves via
/// `recurse`, which is expected to be the caller's top-level diff builder
/// (so each half gets its own affix trim and shortcut checks). Falls back
/// to `[Delete(a), Insert(b)]` if the deadline expires before a meeting
/// point is found.
pub fn run<F>(a: &ByteSpan, b: &ByteSpan, config: &BuildConfig, recurse: F) -> Vec<DiffFragment>
where
    F: Fn(&ByteSpan, &ByteSpan) -> Vec<DiffFragment>,
{
    let m = a.len() as isize;
    let n = b.len() as isize;
    let max_d = (m + n + 1) / 2;
    let v_offset = max_d;
    let v_len = (2 * max_d).max(1) as usize;

    let mut v1 = vec![-1isize; v_len];
    let mut v2 = vec![-1isize; v_len];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = m - n;
    let front = delta % 2 != 0;

    let mut k1start = 0isize;
    let mut k1end = 0isize;
    let mut k2start = 0isize;
    let mut k2end = 0isize;

    for d in 0..max_d {
        if config.is_expired() {
            break;
        }

        // Forward pass.
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < m && y1 < n && a.read_relative(x1 as usize) == b.read_relative(y1 as usize) {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;

            if x1 > m {
                k1end += 2;
            } else if y1 > n {
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && (k2_offset as usize) < v_len && v2[k2_offset as usize] != -1 {
                    let x2 = m - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return split_and_recurse(a, b, x1 as usize, y1 as usize, &recurse);
                    }
                }
            }
            k1 += 2;
        }

        // Reverse pass.
        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < m
                && y2 < n
                && a.read_relative((m - x2 - 1) as usize) == b.read_relative((n - y2 - 1) as usize)
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;

            if x2 > m {
                k2end += 2;
            } else if y2 > n {
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && (k1_offset as usize) < v_len && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    let x2_mirrored = m - x2;
                    if x1 >= x2_mirrored {
                        return split_and_recurse(a, b, x1 as usize, y1 as usize, &recurse);
                    }
                }
            }
            k2 += 2;
        }
    }

    vec![DiffFragment::delete(a.clone()), DiffFragment::insert(b.clone())]
}

fn split_and_recurse<F>(a: &ByteSpan, b: &ByteSpan, x: usize, y: usize, recurse: &F) -> Vec<DiffFragment>
where
    F: Fn(&ByteSpan, &ByteSpan) -> Vec<DiffFragment>,
{
    let mut head = recurse(&a.head(x), &b.head(y));
    let mut tail = recurse(&a.cut(x), &b.cut(y));
    head.append(&mut tail);
    head
}
