// THEORY:
// The engine sorts through a three-operation contract instead of a slice:
//
//     len()            how many elements there are
//     less(i, j)       whether element i orders strictly before element j
//     exchange(i, j)   swap elements i and j wherever they really live
//
// A region's pixels are not a contiguous `[T]` (a column steps by the row stride) and
// a swap may have to move a cached key alongside four channel bytes, so `slice::sort`
// cannot drive them. Anything implementing `Sortable` can be ordered by `sort`.
//
// `sort` is an unstable introsort: median-of-three quicksort, insertion sort for
// short ranges, and a heapsort fallback when recursion runs too deep, so the worst
// case stays O(n log n). Input that is already ordered is detected up front and
// left untouched; among equal keys no exchange happens at all in that case.

/// The operations a comparison sort needs from a sequence.
pub trait Sortable {
    fn len(&self) -> usize;

    /// Whether element `i` must come strictly before element `j`.
    fn less(&self, i: usize, j: usize) -> bool;

    /// Swaps elements `i` and `j` completely.
    fn exchange(&mut self, i: usize, j: usize);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const INSERTION_SORT_THRESHOLD: usize = 12;

/// Whether no element orders before its predecessor.
pub fn is_sorted<S: Sortable + ?Sized>(data: &S) -> bool {
    (1..data.len()).all(|i| !data.less(i, i - 1))
}

/// Sorts `data` in place in ascending `less` order. Not stable.
pub fn sort<S: Sortable + ?Sized>(data: &mut S) {
    let n = data.len();
    if n < 2 || is_sorted(data) {
        return;
    }
    let depth_limit = 2 * (usize::BITS - n.leading_zeros()) as usize;
    quick_sort(data, 0, n, depth_limit);
}

fn quick_sort<S: Sortable + ?Sized>(data: &mut S, mut lo: usize, mut hi: usize, mut depth: usize) {
    while hi - lo > INSERTION_SORT_THRESHOLD {
        if depth == 0 {
            heap_sort(data, lo, hi);
            return;
        }
        depth -= 1;
        let pivot = partition(data, lo, hi);
        // Recurse into the smaller side, loop on the larger one.
        if pivot - lo < hi - (pivot + 1) {
            quick_sort(data, lo, pivot, depth);
            lo = pivot + 1;
        } else {
            quick_sort(data, pivot + 1, hi, depth);
            hi = pivot;
        }
    }
    insertion_sort(data, lo, hi);
}

fn insertion_sort<S: Sortable + ?Sized>(data: &mut S, lo: usize, hi: usize) {
    for i in lo + 1..hi {
        let mut j = i;
        while j > lo && data.less(j, j - 1) {
            data.exchange(j, j - 1);
            j -= 1;
        }
    }
}

/// Orders elements a, b, c so that b holds the median.
fn median_of_three<S: Sortable + ?Sized>(data: &mut S, a: usize, b: usize, c: usize) {
    if data.less(b, a) {
        data.exchange(a, b);
    }
    if data.less(c, b) {
        data.exchange(b, c);
        if data.less(b, a) {
            data.exchange(a, b);
        }
    }
}

/// Partitions `lo..hi` around a median-of-three pivot and returns the pivot's final
/// index. Everything before it is <= pivot, everything after it is >= pivot.
fn partition<S: Sortable + ?Sized>(data: &mut S, lo: usize, hi: usize) -> usize {
    let mid = lo + (hi - lo) / 2;
    median_of_three(data, lo, mid, hi - 1);
    data.exchange(lo, mid);

    let pivot = lo;
    let mut i = lo + 1;
    let mut j = hi - 1;
    loop {
        while i <= j && data.less(i, pivot) {
            i += 1;
        }
        while i <= j && data.less(pivot, j) {
            j -= 1;
        }
        if i >= j {
            break;
        }
        data.exchange(i, j);
        i += 1;
        j -= 1;
    }
    if j != pivot {
        data.exchange(pivot, j);
    }
    j
}

fn heap_sort<S: Sortable + ?Sized>(data: &mut S, lo: usize, hi: usize) {
    let len = hi - lo;
    for root in (0..len / 2).rev() {
        sift_down(data, root, len, lo);
    }
    for end in (1..len).rev() {
        data.exchange(lo, lo + end);
        sift_down(data, 0, end, lo);
    }
}

fn sift_down<S: Sortable + ?Sized>(data: &mut S, mut root: usize, len: usize, offset: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= len {
            return;
        }
        if child + 1 < len && data.less(offset + child, offset + child + 1) {
            child += 1;
        }
        if !data.less(offset + root, offset + child) {
            return;
        }
        data.exchange(offset + root, offset + child);
        root = child;
    }
}
