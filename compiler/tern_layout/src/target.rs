//! Target platform parameters.

/// Word size and register budget of the platform the library was built for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetConfig {
    /// Pointer width in bytes (4 or 8).
    pub word_size: u32,
    /// Largest value, in words, passed in registers.
    pub max_direct_words: u32,
}

impl TargetConfig {
    /// 64-bit targets (arm64, `x86_64`).
    pub const fn host_64() -> Self {
        TargetConfig {
            word_size: 8,
            max_direct_words: 2,
        }
    }

    /// 32-bit targets (armv7, i386, `arm64_32`).
    pub const fn host_32() -> Self {
        TargetConfig {
            word_size: 4,
            max_direct_words: 2,
        }
    }

    /// Word size as a byte count.
    #[inline]
    pub fn word(&self) -> u64 {
        u64::from(self.word_size)
    }

    /// Bytes occupied by `count` words.
    #[inline]
    pub fn words(&self, count: u64) -> u64 {
        count.saturating_mul(self.word())
    }

    /// Number of words needed to hold `size` bytes.
    pub fn words_for(&self, size: u64) -> u32 {
        let word = self.word().max(1);
        u32::try_from(size.div_ceil(word)).unwrap_or(u32::MAX)
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig::host_64()
    }
}
