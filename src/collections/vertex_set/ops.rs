//! Merge kernels over sorted, duplicate-free `Vid` slices.
//!
//! Every kernel assumes both inputs are strictly ascending. This is a precondition,
//! not a checked condition: debug builds assert it, release builds trust it.
//!
//! When one side is much smaller than the other the kernels switch from a linear
//! merge to a galloping search over the larger side. Both paths produce the same
//! output; only the cost differs.

use core::cmp::Ordering;

use super::Vid;

/// Size ratio above which the kernels gallop through the larger input.
const GALLOP_RATIO: usize = 32;

#[inline]
fn debug_check_sorted(s: &[Vid]) {
    debug_assert!(
        s.windows(2).all(|w| w[0] < w[1]),
        "vertex set is not sorted-unique"
    );
}

#[inline]
fn skewed(small: usize, large: usize) -> bool {
    small.saturating_mul(GALLOP_RATIO) < large
}

/// Advances `from` to the first index in `s` with `s[idx] >= x` (exponential then binary search).
#[inline]
fn gallop(s: &[Vid], from: usize, x: Vid) -> usize {
    let mut step = 1usize;
    let mut lo = from;
    let mut hi = from;
    while hi < s.len() && s[hi] < x {
        lo = hi + 1;
        hi = hi.saturating_add(step);
        step <<= 1;
    }
    let hi = hi.min(s.len());
    lo + s[lo..hi].partition_point(|&v| v < x)
}

/// Writes `a ∩ b` into `out` (cleared first), skipping `except` if present.
pub(crate) fn intersect_into(a: &[Vid], b: &[Vid], except: Option<Vid>, out: &mut Vec<Vid>) {
    debug_check_sorted(a);
    debug_check_sorted(b);
    out.clear();
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if small.is_empty() {
        return;
    }
    if skewed(small.len(), large.len()) {
        let mut j = 0;
        for &x in small {
            j = gallop(large, j, x);
            if j == large.len() {
                break;
            }
            if large[j] == x && Some(x) != except {
                out.push(x);
            }
        }
        return;
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                if Some(a[i]) != except {
                    out.push(a[i]);
                }
                i += 1;
                j += 1;
            }
        }
    }
}

/// Returns `|a ∩ b|`, not counting `except`.
pub(crate) fn intersect_count(a: &[Vid], b: &[Vid], except: Option<Vid>) -> usize {
    debug_check_sorted(a);
    debug_check_sorted(b);
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if small.is_empty() {
        return 0;
    }
    let mut n = 0usize;
    if skewed(small.len(), large.len()) {
        let mut j = 0;
        for &x in small {
            j = gallop(large, j, x);
            if j == large.len() {
                break;
            }
            if large[j] == x && Some(x) != except {
                n += 1;
            }
        }
        return n;
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                if Some(a[i]) != except {
                    n += 1;
                }
                i += 1;
                j += 1;
            }
        }
    }
    n
}

/// Writes `a \ b` into `out` (cleared first), skipping `except` if present.
pub(crate) fn subtract_into(a: &[Vid], b: &[Vid], except: Option<Vid>, out: &mut Vec<Vid>) {
    debug_check_sorted(a);
    debug_check_sorted(b);
    out.clear();
    if b.is_empty() || skewed(a.len(), b.len()) {
        let mut j = 0;
        for &x in a {
            j = gallop(b, j, x);
            let in_b = j < b.len() && b[j] == x;
            if !in_b && Some(x) != except {
                out.push(x);
            }
        }
        return;
    }

    let mut j = 0;
    for &x in a {
        while j < b.len() && b[j] < x {
            j += 1;
        }
        let in_b = j < b.len() && b[j] == x;
        if !in_b && Some(x) != except {
            out.push(x);
        }
    }
}

/// Returns `|a \ b|`, not counting `except`.
pub(crate) fn subtract_count(a: &[Vid], b: &[Vid], except: Option<Vid>) -> usize {
    debug_check_sorted(a);
    debug_check_sorted(b);
    if b.is_empty() {
        return a.len() - usize::from(except.is_some_and(|e| a.binary_search(&e).is_ok()));
    }
    // |a \ b| = |a| - |a ∩ b|, minus `except` when it survives the subtraction.
    let common = intersect_count(a, b, None);
    let mut n = a.len() - common;
    if let Some(e) = except {
        if a.binary_search(&e).is_ok() && b.binary_search(&e).is_err() {
            n -= 1;
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallop_finds_lower_bound() {
        let s = [1, 3, 5, 7, 9, 11, 13];
        assert_eq!(gallop(&s, 0, 0), 0);
        assert_eq!(gallop(&s, 0, 6), 3);
        assert_eq!(gallop(&s, 2, 13), 6);
        assert_eq!(gallop(&s, 0, 14), 7);
        assert_eq!(gallop(&s, 7, 20), 7);
    }

    #[test]
    fn test_skewed_paths_agree_with_merge() {
        let small = [4, 100, 250, 999];
        let large: Vec<Vid> = (0..1000).step_by(2).collect();
        let mut out = Vec::new();
        intersect_into(&small, &large, None, &mut out);
        assert_eq!(out, vec![4, 100, 250]);
        assert_eq!(intersect_count(&large, &small, Some(100)), 2);

        subtract_into(&small, &large, None, &mut out);
        assert_eq!(out, vec![999]);
        assert_eq!(subtract_count(&small, &large, Some(999)), 0);
    }
}
