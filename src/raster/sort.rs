//! Sorting of per-row coverage deltas by pixel column. Small rows (the
//! overwhelming common case — most fat rows touch a handful of edges) go
//! through `sort_unstable_by_key`; rows wide enough to amortize the
//! allocation use an LSD radix sort over 8-bit digits, mirroring the
//! original's `kRadixStride = 256` bucket count (§11).

const RADIX_STRIDE: usize = 256;
const RADIX_THRESHOLD: usize = 64;

/// Sorts `(key, value)` pairs by ascending `key`, keeping `value`
/// alongside. Dispatches to a 4-pass base-256 LSD radix sort once `len()`
/// clears [`RADIX_THRESHOLD`]; below that, `sort_unstable_by_key` wins on
/// both speed and code simplicity.
pub fn sort_by_key_u32(keys: &mut [u32], values: &mut [i32]) {
    debug_assert_eq!(keys.len(), values.len());
    if keys.len() < RADIX_THRESHOLD {
        sort_small(keys, values);
    } else {
        radix_sort(keys, values);
    }
}

fn sort_small(keys: &mut [u32], values: &mut [i32]) {
    let mut idx: Vec<usize> = (0..keys.len()).collect();
    idx.sort_unstable_by_key(|&i| keys[i]);
    let sorted_keys: Vec<u32> = idx.iter().map(|&i| keys[i]).collect();
    let sorted_values: Vec<i32> = idx.iter().map(|&i| values[i]).collect();
    keys.copy_from_slice(&sorted_keys);
    values.copy_from_slice(&sorted_values);
}

fn radix_sort(keys: &mut [u32], values: &mut [i32]) {
    let n = keys.len();
    let mut src_k = keys.to_vec();
    let mut src_v = values.to_vec();
    let mut dst_k = vec![0u32; n];
    let mut dst_v = vec![0i32; n];

    for pass in 0..4 {
        let shift = pass * 8;
        let mut counts = [0usize; RADIX_STRIDE];
        for &k in &src_k {
            let digit = ((k >> shift) & 0xFF) as usize;
            counts[digit] += 1;
        }
        let mut offsets = [0usize; RADIX_STRIDE];
        let mut acc = 0usize;
        for d in 0..RADIX_STRIDE {
            offsets[d] = acc;
            acc += counts[d];
        }
        for i in 0..n {
            let digit = ((src_k[i] >> shift) & 0xFF) as usize;
            let pos = offsets[digit];
            dst_k[pos] = src_k[i];
            dst_v[pos] = src_v[i];
            offsets[digit] += 1;
        }
        std::mem::swap(&mut src_k, &mut dst_k);
        std::mem::swap(&mut src_v, &mut dst_v);
    }

    keys.copy_from_slice(&src_k);
    values.copy_from_slice(&src_v);
}
