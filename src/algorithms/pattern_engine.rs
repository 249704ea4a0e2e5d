//! Pattern engine (§4.2): expands a method selector into an ordered, finite sequence of
//! passes, then layers the `verify` and `blank_after` policy transforms on top. Pure and
//! device-agnostic -- the wipe worker drives the resulting [`MethodSpec`], it doesn't
//! build one itself.

use crate::algorithms::round_size::{MethodClass, VerifyMode};

/// One step of a method's pass sequence, pre- or post-policy-transform.
#[derive(Debug, Clone, PartialEq)]
pub enum PassSpec {
    /// Write a repeating 1-3 byte unit across the device.
    Pattern(Vec<u8>),
    /// Draw from the worker's PRNG.
    Random,
    /// Read back and compare against `expected`, or re-derived keystream when `None`
    /// (signals "verify the immediately preceding random pass").
    Verify(Option<Vec<u8>>),
}

/// The overwrite-pattern methods the pattern engine knows how to expand. Hardware
/// methods (`secure_erase*`, `sanitize_*`) bypass the pattern engine entirely -- they're
/// single ATA/NVMe commands handled by the SED/sanitize collaborators, not pass sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Zero,
    One,
    Random,
    DodShort,
    Dod522022M,
    Gutmann,
    Ops2,
    Bruce7,
    /// British HMG Infosec Standard 5, baseline: a single zero pass (§4.2.1).
    Bmb,
    /// British HMG Infosec Standard 5, enhanced: zero/one/random with a mandatory
    /// trailing verify of the random pass, independent of the configured `verify_mode`.
    Is5Enh,
    /// Intrinsic-verify single-pattern methods: verification is baked into the method
    /// itself rather than gated by `verify_mode`.
    VerifyZero,
    VerifyOne,
    /// Hardware-command methods. Each expands to an empty pass body -- the wipe worker
    /// dispatches these to the `HardwareEraseCommand` seam instead of driving passes.
    SecureErase,
    SecureErasePrngVerify,
    SanitizeCryptoErase,
    SanitizeBlockErase,
    SanitizeOverwrite,
}

impl MethodKind {
    /// True for the hardware-command methods that bypass the software pass-sequencer
    /// entirely (§4.2.1) -- these dispatch to `HardwareEraseCommand` instead.
    pub fn is_hardware_command(self) -> bool {
        matches!(
            self,
            MethodKind::SecureErase
                | MethodKind::SecureErasePrngVerify
                | MethodKind::SanitizeCryptoErase
                | MethodKind::SanitizeBlockErase
                | MethodKind::SanitizeOverwrite
        )
    }

    /// The round-size correction class this method belongs to (§4.3).
    pub fn method_class(self) -> MethodClass {
        match self {
            MethodKind::Ops2 => MethodClass::Ops2,
            MethodKind::Is5Enh => MethodClass::Is5Enh,
            // Bmb (IS5 baseline) is a plain single-zero pass with no mandatory trailing
            // verify, unlike Is5Enh -- it takes no round-size correction.
            _ => MethodClass::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSpec {
    pub passes: Vec<PassSpec>,
}

/// The literal 35-pass Gutmann table: 4 random, 27 fixed patterns tuned for various MFM/RLL
/// encodings, 4 random. Only the pattern bytes matter here; the scheme names are informational.
pub(crate) const GUTMANN_PATTERNS: [(Option<&'static [u8]>, &'static str); 35] = [
    (None, "Random Pass 1"),
    (None, "Random Pass 2"),
    (None, "Random Pass 3"),
    (None, "Random Pass 4"),
    (Some(&[0x55]), "0x55 - MFM/RLL encoding"),
    (Some(&[0xAA]), "0xAA - MFM/RLL encoding"),
    (Some(&[0x92, 0x49, 0x24]), "0x92 0x49 0x24 - MFM specific"),
    (Some(&[0x49, 0x24, 0x92]), "0x49 0x24 0x92 - MFM specific"),
    (Some(&[0x24, 0x92, 0x49]), "0x24 0x92 0x49 - MFM specific"),
    (Some(&[0x00]), "0x00 - All zeros"),
    (Some(&[0x11]), "0x11 - Pattern"),
    (Some(&[0x22]), "0x22 - Pattern"),
    (Some(&[0x33]), "0x33 - Pattern"),
    (Some(&[0x44]), "0x44 - Pattern"),
    (Some(&[0x55]), "0x55 - Pattern"),
    (Some(&[0x66]), "0x66 - Pattern"),
    (Some(&[0x77]), "0x77 - Pattern"),
    (Some(&[0x88]), "0x88 - Pattern"),
    (Some(&[0x99]), "0x99 - Pattern"),
    (Some(&[0xAA]), "0xAA - Pattern"),
    (Some(&[0xBB]), "0xBB - Pattern"),
    (Some(&[0xCC]), "0xCC - Pattern"),
    (Some(&[0xDD]), "0xDD - Pattern"),
    (Some(&[0xEE]), "0xEE - Pattern"),
    (Some(&[0xFF]), "0xFF - All ones"),
    (Some(&[0x92, 0x49, 0x24]), "RLL (2,7) pattern 1"),
    (Some(&[0x49, 0x24, 0x92]), "RLL (2,7) pattern 2"),
    (Some(&[0x24, 0x92, 0x49]), "RLL (2,7) pattern 3"),
    (Some(&[0x6D, 0xB6, 0xDB]), "RLL (2,7) pattern 4"),
    (Some(&[0xB6, 0xDB, 0x6D]), "RLL (2,7) pattern 5"),
    (Some(&[0xDB, 0x6D, 0xB6]), "RLL (2,7) pattern 6"),
    (None, "Random Pass 32"),
    (None, "Random Pass 33"),
    (None, "Random Pass 34"),
    (None, "Random Pass 35"),
];

fn base_passes(method: MethodKind) -> Vec<PassSpec> {
    match method {
        MethodKind::Zero => vec![PassSpec::Pattern(vec![0x00])],
        MethodKind::One => vec![PassSpec::Pattern(vec![0xFF])],
        MethodKind::Random => vec![PassSpec::Random],
        MethodKind::DodShort => vec![
            PassSpec::Pattern(vec![0x00]),
            PassSpec::Pattern(vec![0xFF]),
            PassSpec::Random,
        ],
        MethodKind::Dod522022M => vec![
            PassSpec::Pattern(vec![0x00]),
            PassSpec::Pattern(vec![0xFF]),
            PassSpec::Random,
            PassSpec::Pattern(vec![0x00]),
            PassSpec::Pattern(vec![0xFF]),
            PassSpec::Random,
            PassSpec::Random,
        ],
        MethodKind::Gutmann => GUTMANN_PATTERNS
            .iter()
            .map(|(pattern, _label)| match pattern {
                Some(bytes) => PassSpec::Pattern(bytes.to_vec()),
                None => PassSpec::Random,
            })
            .collect(),
        // RCMP OPS-II: three rounds of zero/one/random are handled by `rounds`; the base
        // body here is one round's worth (matches the `ops2` round-size correction).
        MethodKind::Ops2 => vec![
            PassSpec::Pattern(vec![0x00]),
            PassSpec::Pattern(vec![0xFF]),
            PassSpec::Random,
        ],
        // Bruce Schneier's 7-pass: one 0xFF, one 0x00, five random.
        MethodKind::Bruce7 => vec![
            PassSpec::Pattern(vec![0xFF]),
            PassSpec::Pattern(vec![0x00]),
            PassSpec::Random,
            PassSpec::Random,
            PassSpec::Random,
            PassSpec::Random,
            PassSpec::Random,
        ],
        // British HMG Infosec Standard 5, baseline: a single zero pass.
        MethodKind::Bmb => vec![PassSpec::Pattern(vec![0x00])],
        // British HMG Infosec Standard 5, enhanced: zero, one, random -- the mandatory
        // trailing verify of the random pass is appended in `build_method`, not here,
        // since it must appear even when the caller asked for `VerifyMode::None`.
        MethodKind::Is5Enh => vec![
            PassSpec::Pattern(vec![0x00]),
            PassSpec::Pattern(vec![0xFF]),
            PassSpec::Random,
        ],
        // Intrinsic-verify single-pattern methods: the verify is part of the method's
        // own definition, appended unconditionally in `build_method`.
        MethodKind::VerifyZero => vec![PassSpec::Pattern(vec![0x00])],
        MethodKind::VerifyOne => vec![PassSpec::Pattern(vec![0xFF])],
        // Hardware-command methods carry no software pass body; the worker dispatches
        // these to `HardwareEraseCommand` instead of iterating passes.
        MethodKind::SecureErase
        | MethodKind::SecureErasePrngVerify
        | MethodKind::SanitizeCryptoErase
        | MethodKind::SanitizeBlockErase
        | MethodKind::SanitizeOverwrite => vec![],
    }
}

/// Expands `method` into its full pass sequence: `rounds` repetitions of the base body,
/// with the verify and blank policy transforms applied per §4.2.
///
/// Order of operations matters here: `VerifyMode::Last` attaches to the last *write* pass
/// of the body (before any blank is appended), and the blank pass -- when present -- is
/// always the true final pass with no verify of its own unless `verify == All`.
pub fn build_method(
    method: MethodKind,
    rounds: u32,
    verify: VerifyMode,
    blank_after: bool,
) -> MethodSpec {
    assert!(rounds >= 1, "rounds must be >= 1");

    if method.is_hardware_command() {
        return MethodSpec { passes: Vec::new() };
    }

    let body = base_passes(method);
    let mut passes = Vec::new();

    for _ in 0..rounds {
        for pass in &body {
            passes.push(pass.clone());
            if verify == VerifyMode::All {
                passes.push(verify_target_for(pass));
            }
        }
    }

    if verify == VerifyMode::Last {
        if let Some(last_write) = passes.iter().rev().find(|p| !matches!(p, PassSpec::Verify(_))) {
            let target = verify_target_for(last_write);
            passes.push(target);
        }
    }

    if blank_after {
        let blank = PassSpec::Pattern(vec![0x00]);
        passes.push(blank.clone());
        if verify == VerifyMode::All {
            passes.push(verify_target_for(&blank));
        }
    }

    // is5enh and the intrinsic-verify methods carry their own verify step baked into the
    // method definition -- it must appear even under `VerifyMode::None`, and it must not
    // be duplicated when the caller already asked for `Last`/`All` (which covered it above).
    let needs_intrinsic_verify = matches!(
        method,
        MethodKind::Is5Enh | MethodKind::VerifyZero | MethodKind::VerifyOne
    );
    if needs_intrinsic_verify && verify == VerifyMode::None {
        if let Some(last_write) = passes.iter().rev().find(|p| !matches!(p, PassSpec::Verify(_))) {
            let target = verify_target_for(last_write);
            passes.push(target);
        }
    }

    MethodSpec { passes }
}

fn verify_target_for(pass: &PassSpec) -> PassSpec {
    match pass {
        PassSpec::Pattern(bytes) => PassSpec::Verify(Some(bytes.clone())),
        PassSpec::Random => PassSpec::Verify(None),
        PassSpec::Verify(_) => pass.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dod_short_verify_last_with_blank() {
        // §8 scenario 1: verify targets the last write of the body (the random pass),
        // and the blank pass that follows carries no verify of its own.
        let spec = build_method(MethodKind::DodShort, 1, VerifyMode::Last, true);
        assert_eq!(
            spec.passes,
            vec![
                PassSpec::Pattern(vec![0x00]),
                PassSpec::Pattern(vec![0xFF]),
                PassSpec::Random,
                PassSpec::Verify(None),
                PassSpec::Pattern(vec![0x00]),
            ]
        );
    }

    #[test]
    fn verify_none_inserts_no_verify_passes() {
        let spec = build_method(MethodKind::Zero, 1, VerifyMode::None, false);
        assert_eq!(spec.passes, vec![PassSpec::Pattern(vec![0x00])]);
    }

    #[test]
    fn verify_all_doubles_every_pass() {
        let spec = build_method(MethodKind::DodShort, 1, VerifyMode::All, false);
        assert_eq!(spec.passes.len(), 6);
        assert_eq!(spec.passes[1], PassSpec::Verify(Some(vec![0x00])));
        assert_eq!(spec.passes[5], PassSpec::Verify(None));
    }

    #[test]
    fn verify_all_with_blank_also_verifies_the_blank() {
        let spec = build_method(MethodKind::Zero, 1, VerifyMode::All, true);
        assert_eq!(
            spec.passes,
            vec![
                PassSpec::Pattern(vec![0x00]),
                PassSpec::Verify(Some(vec![0x00])),
                PassSpec::Pattern(vec![0x00]),
                PassSpec::Verify(Some(vec![0x00])),
            ]
        );
    }

    #[test]
    fn rounds_multiplies_the_body() {
        let spec = build_method(MethodKind::Zero, 3, VerifyMode::None, false);
        assert_eq!(spec.passes.len(), 3);
    }

    #[test]
    fn gutmann_has_35_passes() {
        let spec = build_method(MethodKind::Gutmann, 1, VerifyMode::None, false);
        assert_eq!(spec.passes.len(), 35);
    }

    #[test]
    fn bmb_is_a_single_zero_pass() {
        let spec = build_method(MethodKind::Bmb, 1, VerifyMode::None, false);
        assert_eq!(spec.passes, vec![PassSpec::Pattern(vec![0x00])]);
    }

    #[test]
    fn is5enh_verifies_the_random_pass_even_under_verify_none() {
        let spec = build_method(MethodKind::Is5Enh, 1, VerifyMode::None, false);
        assert_eq!(
            spec.passes,
            vec![
                PassSpec::Pattern(vec![0x00]),
                PassSpec::Pattern(vec![0xFF]),
                PassSpec::Random,
                PassSpec::Verify(None),
            ]
        );
    }

    #[test]
    fn is5enh_does_not_double_the_verify_under_verify_last() {
        let spec = build_method(MethodKind::Is5Enh, 1, VerifyMode::Last, false);
        assert_eq!(spec.passes.iter().filter(|p| matches!(p, PassSpec::Verify(_))).count(), 1);
    }

    #[test]
    fn verify_zero_and_one_carry_an_intrinsic_verify() {
        let zero = build_method(MethodKind::VerifyZero, 1, VerifyMode::None, false);
        assert_eq!(
            zero.passes,
            vec![PassSpec::Pattern(vec![0x00]), PassSpec::Verify(Some(vec![0x00]))]
        );
        let one = build_method(MethodKind::VerifyOne, 1, VerifyMode::None, false);
        assert_eq!(
            one.passes,
            vec![PassSpec::Pattern(vec![0xFF]), PassSpec::Verify(Some(vec![0xFF]))]
        );
    }

    #[test]
    fn hardware_methods_expand_to_no_software_passes() {
        for method in [
            MethodKind::SecureErase,
            MethodKind::SecureErasePrngVerify,
            MethodKind::SanitizeCryptoErase,
            MethodKind::SanitizeBlockErase,
            MethodKind::SanitizeOverwrite,
        ] {
            assert!(method.is_hardware_command());
            let spec = build_method(method, 1, VerifyMode::Last, true);
            assert!(spec.passes.is_empty());
        }
    }

    #[test]
    fn method_class_mapping_matches_round_size_corrections() {
        assert_eq!(MethodKind::Ops2.method_class(), MethodClass::Ops2);
        // Bmb has no mandatory trailing verify (unlike Is5Enh), so it takes no round-size
        // correction -- see `needs_intrinsic_verify` below.
        assert_eq!(MethodKind::Bmb.method_class(), MethodClass::Default);
        assert_eq!(MethodKind::Is5Enh.method_class(), MethodClass::Is5Enh);
        assert_eq!(MethodKind::DodShort.method_class(), MethodClass::Default);
    }
}
