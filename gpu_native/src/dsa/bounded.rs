/// Copies the NUL-terminated `src` into `dst`, never writing past `N` bytes.
///
/// The end of `src` counts as a terminator too. When `src` terminates within
/// `N - 1` bytes, `dst` receives the whole string followed by a NUL.
/// Otherwise exactly `N - 1` bytes are copied and then `dst[0]` is set to NUL:
/// an over-long source becomes the empty string, not a truncated prefix.
/// Bytes `1..N-1` keep what was copied on that path; only `dst[0]` matters
/// to a reader.
#[inline]
pub fn copy_bounded<const N: usize>(dst: &mut [u8; N], src: &[u8]) {
    const { assert!(N > 0, "destination must have room for a terminator") };

    let mut i = 0;
    while i < N - 1 && i < src.len() && src[i] != 0 {
        dst[i] = src[i];
        i += 1;
    }
    if i == N - 1 {
        dst[0] = 0;
    } else {
        dst[i] = 0;
    }
}

/// The bytes of a NUL-terminated field, up to (not including) the first NUL.
#[inline]
pub fn until_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_source_is_copied_with_terminator() {
        let mut dst = [0xAAu8; 8];
        copy_bounded(&mut dst, b"hello\0");
        assert_eq!(&dst[..6], b"hello\0");
        assert_eq!(&dst[6..], &[0xAA, 0xAA]);
    }

    #[test]
    fn long_source_clears_to_empty() {
        let mut dst = [0u8; 8];
        copy_bounded(&mut dst, b"helloworld\0");
        assert_eq!(dst[0], 0);
        assert_eq!(until_nul(&dst), b"");
        // The dead tail still holds the copied bytes.
        assert_eq!(&dst[1..7], b"ellowo");
    }

    #[test]
    fn source_of_exactly_capacity_minus_one_is_cleared() {
        let mut dst = [0u8; 8];
        copy_bounded(&mut dst, b"1234567\0");
        assert_eq!(dst[0], 0);
    }

    #[test]
    fn source_of_capacity_minus_two_fits() {
        let mut dst = [0u8; 8];
        copy_bounded(&mut dst, b"123456\0");
        assert_eq!(until_nul(&dst), b"123456");
        assert_eq!(dst[6], 0);
    }

    #[test]
    fn embedded_nul_stops_the_copy() {
        let mut dst = [0xFFu8; 16];
        copy_bounded(&mut dst, b"ab\0cd\0");
        assert_eq!(&dst[..3], b"ab\0");
        assert_eq!(dst[3], 0xFF);
    }

    #[test]
    fn slice_end_acts_as_terminator() {
        let mut dst = [0xFFu8; 8];
        copy_bounded(&mut dst, b"abc");
        assert_eq!(&dst[..4], b"abc\0");
    }

    #[test]
    fn empty_source_yields_empty_string() {
        let mut dst = [0xFFu8; 4];
        copy_bounded(&mut dst, b"");
        assert_eq!(dst[0], 0);
    }

    #[test]
    fn single_byte_destination_is_always_empty() {
        let mut dst = [0xFFu8; 1];
        copy_bounded(&mut dst, b"x\0");
        assert_eq!(dst, [0]);
        copy_bounded(&mut dst, b"\0");
        assert_eq!(dst, [0]);
    }

    fn non_nul_bytes(len: impl Into<proptest::collection::SizeRange>) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(1u8..=255, len)
    }

    proptest! {
        #[test]
        fn short_sources_round_trip(src in non_nul_bytes(0..31usize)) {
            let mut dst = [0x55u8; 32];
            let mut terminated = src.clone();
            terminated.push(0);
            copy_bounded(&mut dst, &terminated);
            prop_assert_eq!(until_nul(&dst), src.as_slice());
            prop_assert_eq!(dst[src.len()], 0);
        }

        #[test]
        fn long_sources_become_empty(src in non_nul_bytes(31..200usize)) {
            let mut dst = [0x55u8; 32];
            copy_bounded(&mut dst, &src);
            prop_assert_eq!(dst[0], 0);
            prop_assert_eq!(&dst[1..31], &src[1..31]);
            prop_assert_eq!(dst[31], 0x55);
        }
    }
}
