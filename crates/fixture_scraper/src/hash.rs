/// Stable 32-bit string hash shared by fixture ids and synthetic team profiles.
///
/// Java-style `h = h * 31 + unit` over UTF-16 code units with a wrapping
/// signed 32-bit accumulator, returned as its absolute value. The exact
/// algorithm matters: ids and ratings must be identical across processes and
/// across implementations fed the same strings.
pub fn stable_hash(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(0i32, |h, unit| {
            h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}
