//! Block kernels and runtime CPU feature detection
//!
//! Every kernel shares one contract: it consumes whole blocks from the front
//! of its input, writes the matching output, and reports how many input bytes
//! it consumed. Decode kernels stop at the first block holding padding or an
//! invalid character. Which kernels exist is decided by `cfg(target_arch)`
//! and the `simd` feature; which are used is decided by [`Capabilities`].

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

use crate::config::DispatchConfig;

pub mod scalar;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod x86_64;

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
mod aarch64;

/// Smallest SVE vector, in bytes, worth dispatching to.
///
/// Below this the NEON kernel is at least as fast.
pub const SVE_MIN_VECTOR_BYTES: usize = 32;

/// One kernel variant, ordered fastest first in [`Tier::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// x86-64 AVX-512 VBMI: 48 bytes <-> 64 chars.
    #[serde(alias = "avx512")]
    Avx512Vbmi,
    /// aarch64 SVE: one trio per vector byte lane.
    Sve,
    /// aarch64 NEON: 12 bytes <-> 16 chars.
    Neon,
    /// Portable: 3 bytes <-> 4 chars. Always available.
    Scalar,
}

impl Tier {
    /// All tiers, fastest first. The dispatcher walks them in this order.
    pub const ALL: [Tier; 4] = [Tier::Avx512Vbmi, Tier::Sve, Tier::Neon, Tier::Scalar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Avx512Vbmi => "avx512vbmi",
            Tier::Sve => "sve",
            Tier::Neon => "neon",
            Tier::Scalar => "scalar",
        }
    }

    /// Position in the speed ordering; higher is faster.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Avx512Vbmi => 3,
            Tier::Sve => 2,
            Tier::Neon => 1,
            Tier::Scalar => 0,
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avx512vbmi" | "avx512" => Ok(Tier::Avx512Vbmi),
            "sve" => Ok(Tier::Sve),
            "neon" => Ok(Tier::Neon),
            "scalar" => Ok(Tier::Scalar),
            _ => Err(format!(
                "unknown tier '{}' (expected avx512vbmi, sve, neon or scalar)",
                s
            )),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware features usable by this process.
///
/// A value never reports a feature the host lacks: the only ways to build
/// one are [`Capabilities::probe`], [`Capabilities::scalar_only`] and
/// [`Capabilities::restrict`], which can only remove features. The
/// dispatcher relies on this to call `target_feature` kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    avx512vbmi: bool,
    neon: bool,
    sve_vector_length: usize,
}

static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

impl Capabilities {
    /// No acceleration at all.
    pub const fn scalar_only() -> Self {
        Capabilities {
            avx512vbmi: false,
            neon: false,
            sve_vector_length: 0,
        }
    }

    /// Queries the hardware directly, bypassing the process-wide cache.
    pub fn probe() -> Self {
        Capabilities {
            avx512vbmi: probe_avx512vbmi(),
            neon: probe_neon(),
            sve_vector_length: probe_sve_vector_length(),
        }
    }

    /// The cached result of [`detect_capabilities`], or [`scalar_only`]
    /// if detection has not run yet.
    ///
    /// [`scalar_only`]: Capabilities::scalar_only
    pub fn detected() -> Self {
        CAPABILITIES.get().copied().unwrap_or_default()
    }

    pub fn has_avx512vbmi(&self) -> bool {
        self.avx512vbmi
    }

    pub fn has_neon(&self) -> bool {
        self.neon
    }

    /// SVE vector length in bytes, 0 when SVE is absent.
    pub fn sve_vector_length(&self) -> usize {
        self.sve_vector_length
    }

    /// Whether the dispatcher may run `tier` on this host.
    pub fn supports(&self, tier: Tier) -> bool {
        match tier {
            Tier::Avx512Vbmi => self.avx512vbmi,
            Tier::Sve => self.sve_vector_length >= SVE_MIN_VECTOR_BYTES,
            Tier::Neon => self.neon,
            Tier::Scalar => true,
        }
    }

    /// Drops every feature the dispatch configuration excludes.
    pub fn restrict(mut self, config: &DispatchConfig) -> Self {
        for tier in Tier::ALL {
            if config.allows(tier) {
                continue;
            }
            match tier {
                Tier::Avx512Vbmi => self.avx512vbmi = false,
                Tier::Sve => self.sve_vector_length = 0,
                Tier::Neon => self.neon = false,
                Tier::Scalar => {}
            }
        }
        self
    }

    /// The fastest tier this set enables.
    pub fn best_tier(&self) -> Tier {
        Tier::ALL
            .into_iter()
            .find(|&tier| self.supports(tier))
            .unwrap_or(Tier::Scalar)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "avx512vbmi={} neon={} sve_vector_length={}",
            self.avx512vbmi, self.neon, self.sve_vector_length
        )
    }
}

/// Probes the host once and caches the result for the whole process.
///
/// Call this during startup, before encoding or decoding on several threads.
/// Later calls are no-ops. Absent features are not errors.
pub fn detect_capabilities() {
    CAPABILITIES.get_or_init(|| {
        let caps = Capabilities::probe();
        debug!(%caps, best = %caps.best_tier(), "detected cpu capabilities");
        caps
    });
}

/// Cached AVX-512 VBMI flag. Never triggers detection.
pub fn has_avx512vbmi() -> bool {
    Capabilities::detected().has_avx512vbmi()
}

/// Cached SVE vector length in bytes (0 = absent). Never triggers detection.
pub fn sve_vector_length() -> usize {
    Capabilities::detected().sve_vector_length()
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn probe_avx512vbmi() -> bool {
    x86_64::has_avx512vbmi()
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
fn probe_avx512vbmi() -> bool {
    false
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
fn probe_neon() -> bool {
    aarch64::has_neon()
}

#[cfg(not(all(feature = "simd", target_arch = "aarch64")))]
fn probe_neon() -> bool {
    false
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
fn probe_sve_vector_length() -> usize {
    aarch64::sve_vector_bytes()
}

#[cfg(not(all(feature = "simd", target_arch = "aarch64")))]
fn probe_sve_vector_length() -> usize {
    0
}

/// Input bytes per encode block for `tier`.
pub(crate) fn encode_block(tier: Tier, caps: &Capabilities) -> usize {
    match tier {
        Tier::Avx512Vbmi => 48,
        Tier::Sve => caps.sve_vector_length * 3,
        Tier::Neon => 12,
        Tier::Scalar => 3,
    }
}

/// Input characters per decode block for `tier`.
pub(crate) fn decode_block(tier: Tier, caps: &Capabilities) -> usize {
    match tier {
        Tier::Avx512Vbmi => 64,
        Tier::Sve => caps.sve_vector_length * 4,
        Tier::Neon => 16,
        Tier::Scalar => 4,
    }
}

/// Runs `tier`'s encode kernel over the whole blocks at the front of `input`.
///
/// Returns input bytes consumed, always a multiple of 3. `caps` must support
/// `tier`. The scalar tier consumes nothing here; it runs as the finisher.
#[cfg_attr(not(feature = "simd"), allow(unused_variables))]
pub(crate) fn encode_blocks(
    tier: Tier,
    caps: &Capabilities,
    input: &[u8],
    out: &mut [u8],
) -> usize {
    debug_assert!(caps.supports(tier), "{tier} dispatched without capability");
    match tier {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        // SAFETY: `caps` only reports AVX-512 VBMI when the host has it.
        Tier::Avx512Vbmi => unsafe { x86_64::encode_base64_avx512(input, out) },
        #[cfg(all(feature = "simd", target_arch = "aarch64"))]
        // SAFETY: `caps` only reports a vector length when the host has SVE.
        Tier::Sve => unsafe { aarch64::encode_base64_sve(input, out) },
        #[cfg(all(feature = "simd", target_arch = "aarch64"))]
        Tier::Neon => aarch64::encode_base64_neon(input, out),
        #[allow(unreachable_patterns)]
        _ => 0,
    }
}

/// Runs `tier`'s decode kernel until the input runs out of whole blocks or a
/// block holds padding or an invalid character.
///
/// Returns input characters consumed, always a multiple of 4. `caps` must
/// support `tier`. The scalar tier consumes nothing here.
#[cfg_attr(not(feature = "simd"), allow(unused_variables))]
pub(crate) fn decode_blocks(
    tier: Tier,
    caps: &Capabilities,
    input: &[u8],
    out: &mut [u8],
) -> usize {
    debug_assert!(caps.supports(tier), "{tier} dispatched without capability");
    match tier {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        // SAFETY: `caps` only reports AVX-512 VBMI when the host has it.
        Tier::Avx512Vbmi => unsafe { x86_64::decode_base64_avx512(input, out) },
        #[cfg(all(feature = "simd", target_arch = "aarch64"))]
        // SAFETY: `caps` only reports a vector length when the host has SVE.
        Tier::Sve => unsafe { aarch64::decode_base64_sve(input, out) },
        #[cfg(all(feature = "simd", target_arch = "aarch64"))]
        Tier::Neon => aarch64::decode_base64_neon(input, out),
        #[allow(unreachable_patterns)]
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_only_supports_scalar() {
        let caps = Capabilities::scalar_only();
        assert!(caps.supports(Tier::Scalar));
        assert!(!caps.supports(Tier::Avx512Vbmi));
        assert!(!caps.supports(Tier::Neon));
        assert!(!caps.supports(Tier::Sve));
        assert_eq!(caps.best_tier(), Tier::Scalar);
        assert_eq!(caps, Capabilities::default());
    }

    #[test]
    fn test_probe_matches_arch() {
        let caps = Capabilities::probe();
        if !cfg!(target_arch = "x86_64") {
            assert!(!caps.has_avx512vbmi());
        }
        if !cfg!(target_arch = "aarch64") {
            assert!(!caps.has_neon());
            assert_eq!(caps.sve_vector_length(), 0);
        }
        if cfg!(all(feature = "simd", target_arch = "aarch64")) {
            assert!(caps.has_neon());
        }
    }

    #[test]
    fn test_detect_is_idempotent() {
        detect_capabilities();
        let first = Capabilities::detected();
        detect_capabilities();
        assert_eq!(first, Capabilities::detected());
        assert_eq!(first, Capabilities::probe());
        assert_eq!(has_avx512vbmi(), first.has_avx512vbmi());
        assert_eq!(sve_vector_length(), first.sve_vector_length());
    }

    #[test]
    fn test_restrict_removes_features() {
        let config = DispatchConfig {
            max_tier: Some(Tier::Scalar),
            disable: Vec::new(),
        };
        let caps = Capabilities::probe().restrict(&config);
        assert_eq!(caps, Capabilities::scalar_only());

        let config = DispatchConfig {
            max_tier: None,
            disable: vec![Tier::Avx512Vbmi, Tier::Sve],
        };
        let caps = Capabilities::probe().restrict(&config);
        assert!(!caps.has_avx512vbmi());
        assert_eq!(caps.sve_vector_length(), 0);
        assert_eq!(caps.has_neon(), Capabilities::probe().has_neon());
    }

    #[test]
    fn test_tier_names_round_trip() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_str(tier.as_str()), Ok(tier));
        }
        assert_eq!(Tier::from_str("AVX512"), Ok(Tier::Avx512Vbmi));
        assert!(Tier::from_str("sse2").is_err());
    }

    #[test]
    fn test_tier_order_is_fastest_first() {
        let ranks: Vec<u8> = Tier::ALL.iter().map(Tier::rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_block_ratios() {
        let caps = Capabilities::scalar_only();
        for tier in [Tier::Avx512Vbmi, Tier::Neon, Tier::Scalar] {
            assert_eq!(encode_block(tier, &caps) * 4, decode_block(tier, &caps) * 3);
        }
    }

    #[test]
    fn test_scalar_tier_has_no_block_kernel() {
        let caps = Capabilities::scalar_only();
        let mut out = [0u8; 16];
        assert_eq!(encode_blocks(Tier::Scalar, &caps, b"ManMan", &mut out), 0);
        assert_eq!(decode_blocks(Tier::Scalar, &caps, b"TWFuTWFu", &mut out), 0);
    }
}
