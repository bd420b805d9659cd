/// Advisory lock key for a lock name.
///
/// This is the 32-bit `s[0]*31^(n-1) + ... + s[n-1]` string hash over UTF-16 code units,
/// so keys agree with other clients that derive lock numbers the same way.
#[must_use]
pub fn lock_key(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
}
