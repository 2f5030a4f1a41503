/// Number of channels in a displayable image.
pub const NUM_COLORS: usize = 3;

/// Expand an 8-bit mono buffer into interleaved BGR.
///
/// Each input byte is repeated once per channel, so the output is
/// `3 * mono.len()` bytes long.
pub fn mono_to_bgr(mono: &[u8]) -> Vec<u8> {
    let mut bgr = Vec::with_capacity(mono.len() * NUM_COLORS);
    for &value in mono {
        bgr.extend_from_slice(&[value; NUM_COLORS]);
    }
    bgr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(mono_to_bgr(&[]).is_empty());
    }

    #[test]
    fn every_byte_is_tripled_in_place() {
        let mono: Vec<u8> = (0..=255).collect();
        let bgr = mono_to_bgr(&mono);

        assert_eq!(bgr.len(), 3 * mono.len());
        for (i, &value) in mono.iter().enumerate() {
            assert_eq!(&bgr[3 * i..3 * i + 3], &[value, value, value]);
        }
    }

    #[test]
    fn small_buffer() {
        assert_eq!(mono_to_bgr(&[1, 200]), vec![1, 1, 1, 200, 200, 200]);
    }
}
