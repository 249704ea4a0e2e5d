//! Cryptographically strong and statistically strong keystream generators.
//!
//! Every PRNG behind [`WipePrng`] honours the same contract: seed once via [`PrngAlgorithm::init`],
//! then repeatedly call [`WipePrng::fill`] to draw a lazily produced, deterministic byte stream.
//! `fill` is length-agnostic, never fails after a successful `init`, and must be driven from a
//! single thread (the worker that owns it) -- there is no cross-thread sharing or cloning.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;
use anyhow::{anyhow, Result};
use blake2::{Blake2b512, Digest as Blake2Digest};
use generic_array::GenericArray;
use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};

use crate::crypto::entropy_gate::entropy_gate;

/// The PRNG families selectable via the `prng` configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrngAlgorithm {
    /// Accepted for configuration compatibility; resolves to the same generator as
    /// `Xoshiro256` (this engine has no standalone Mersenne Twister implementation).
    Twister,
    /// Accepted for configuration compatibility; resolves to `Xoshiro256` (no standalone
    /// ISAAC implementation).
    Isaac,
    /// Modified xoshiro-256, §4.1: full 256-bit state emitted per step.
    Xoshiro256,
    /// AES-256 in counter mode, key derived from SHA-256(seed).
    AesCtr,
    /// AES-256-XTS, keys derived from BLAKE2b-512(seed), zero tweak.
    AesXts,
    /// Ascon-PRF v1.3 variant-6 sponge stream.
    Ascon,
}

impl Default for PrngAlgorithm {
    fn default() -> Self {
        PrngAlgorithm::AesCtr
    }
}

/// A seeded, ready-to-draw keystream generator.
pub trait WipePrng: Send {
    /// Fill `out` completely with the next `out.len()` bytes of keystream.
    fn fill(&mut self, out: &mut [u8]);

    /// Snapshots the generator's current internal state. The worker takes a snapshot at
    /// the start of any random pass scheduled for later verification, so it can re-derive
    /// the same keystream during the verify pass without replaying every write in between.
    fn snapshot(&self) -> Box<dyn WipePrng>;
}

impl PrngAlgorithm {
    /// Seed a fresh generator. `seed` should be at least 32 bytes from the entropy reader;
    /// shorter seeds are accepted but reduce the effective keyspace of the hash-derived PRNGs.
    pub fn init(self, seed: &[u8]) -> Result<Box<dyn WipePrng>> {
        match self {
            // `twister` and `isaac` alias to the modified xoshiro-256 generator: this engine
            // does not implement a separate Mersenne Twister/ISAAC generator (see DESIGN.md).
            PrngAlgorithm::Twister | PrngAlgorithm::Isaac | PrngAlgorithm::Xoshiro256 => {
                Xoshiro256Prng::seed(seed).map(|p| Box::new(p) as Box<dyn WipePrng>)
            }
            PrngAlgorithm::AesCtr => AesCtrPrng::seed(seed).map(|p| Box::new(p) as Box<dyn WipePrng>),
            PrngAlgorithm::AesXts => AesXtsPrng::seed(seed).map(|p| Box::new(p) as Box<dyn WipePrng>),
            PrngAlgorithm::Ascon => AsconPrf::seed(seed).map(|p| Box::new(p) as Box<dyn WipePrng>),
        }
    }
}

/// Modified xoshiro-256, per §4.1: the entire 256-bit state is emitted each step (no
/// scrambler is applied to the output), and the state advance happens before emission.
/// This mirrors a documented quirk of the source engine rather than the canonical
/// xoshiro256** construction -- see the "Open questions" note in the design doc.
#[derive(Clone)]
pub struct Xoshiro256Prng {
    s: [u64; 4],
    block: [u8; 32],
    pos: usize,
}

impl Xoshiro256Prng {
    /// Seeds the generator and runs its first output block through the entropy gate
    /// (§4.8) before releasing it for use, same as every other PRNG behind this trait.
    pub fn seed(seed: &[u8]) -> Result<Self> {
        let mut s = [0u64; 4];
        let mut padded = [0u8; 32];
        let n = seed.len().min(32);
        padded[..n].copy_from_slice(&seed[..n]);
        for i in 0..4 {
            s[i] = u64::from_le_bytes(padded[i * 8..i * 8 + 8].try_into().unwrap());
        }
        if s == [0u64; 4] {
            // Reject the degenerate all-zero state; fold in a fixed nonzero constant.
            s[0] = 0x9E3779B97F4A7C15;
        }
        let mut prng = Xoshiro256Prng {
            s,
            block: [0u8; 32],
            pos: 32,
        };
        prng.step();
        let sample = u64::from_le_bytes(prng.block[..8].try_into().unwrap());
        if !entropy_gate(sample) {
            return Err(anyhow!("xoshiro256 PRNG failed entropy gate on initialization"));
        }
        prng.pos = 0;
        Ok(prng)
    }

    fn step(&mut self) {
        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);
        for i in 0..4 {
            self.block[i * 8..i * 8 + 8].copy_from_slice(&self.s[i].to_le_bytes());
        }
    }
}

impl WipePrng for Xoshiro256Prng {
    fn fill(&mut self, out: &mut [u8]) {
        let mut written = 0;
        while written < out.len() {
            if self.pos >= 32 {
                self.step();
                self.pos = 0;
            }
            let take = (32 - self.pos).min(out.len() - written);
            out[written..written + take].copy_from_slice(&self.block[self.pos..self.pos + take]);
            self.pos += take;
            written += take;
        }
    }

    fn snapshot(&self) -> Box<dyn WipePrng> {
        Box::new(self.clone())
    }
}

/// AES-256 counter mode. Key = SHA-256(seed). IV = 0 (128-bit little-endian counter).
/// `fill` is equivalent to encrypting a run of zeroed plaintext blocks and emitting the
/// ciphertext; the counter advances by one 16-byte block per output block.
#[derive(Clone)]
pub struct AesCtrPrng {
    cipher: Aes256,
    counter: u128,
    block: [u8; 16],
    pos: usize,
}

impl AesCtrPrng {
    /// Seeds the generator and runs its first output block through the entropy gate
    /// (§4.8) before releasing it for use.
    pub fn seed(seed: &[u8]) -> Result<Self> {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        let key = hasher.finalize();
        let cipher = Aes256::new(GenericArray::from_slice(&key));
        let mut prng = AesCtrPrng {
            cipher,
            counter: 0,
            block: [0u8; 16],
            pos: 16,
        };
        prng.next_block();
        let sample = u64::from_le_bytes(prng.block[..8].try_into().unwrap());
        if !entropy_gate(sample) {
            return Err(anyhow!("AES-CTR PRNG failed entropy gate on initialization"));
        }
        prng.pos = 0;
        Ok(prng)
    }

    fn next_block(&mut self) {
        let mut plaintext = GenericArray::clone_from_slice(&self.counter.to_le_bytes());
        self.cipher.encrypt_block(&mut plaintext);
        self.block.copy_from_slice(&plaintext);
        self.counter = self.counter.wrapping_add(1);
    }
}

impl WipePrng for AesCtrPrng {
    fn fill(&mut self, out: &mut [u8]) {
        let mut written = 0;
        while written < out.len() {
            if self.pos >= 16 {
                self.next_block();
                self.pos = 0;
            }
            let take = (16 - self.pos).min(out.len() - written);
            out[written..written + take].copy_from_slice(&self.block[self.pos..self.pos + take]);
            self.pos += take;
            written += take;
        }
    }

    fn snapshot(&self) -> Box<dyn WipePrng> {
        Box::new(self.clone())
    }
}

/// AES-256-XTS. Keys = BLAKE2b-512(seed) split into two 256-bit subkeys. Zero tweak,
/// block counter advances internally. A 512-bit sample of the first block is drawn and
/// its low 64 bits must pass the entropy gate before the generator is released for use.
#[derive(Clone)]
pub struct AesXtsPrng {
    data_cipher: Aes256,
    /// Tweak for the next 16-byte chunk to be produced: `E_tweak(0) * alpha^index` in
    /// GF(2^128), carried forward one `gf128_double` per chunk rather than recomputed
    /// from `alpha^0` on every call -- doubling is O(1) per chunk, so keystream
    /// generation stays linear in output length instead of quadratic.
    current_tweak: [u8; 16],
    block: [u8; 64],
    pos: usize,
}

impl AesXtsPrng {
    pub fn seed(seed: &[u8]) -> Result<Self> {
        let mut hasher = Blake2b512::new();
        hasher.update(seed);
        let key = hasher.finalize();
        let data_cipher = Aes256::new(GenericArray::from_slice(&key[..32]));
        let tweak_cipher = Aes256::new(GenericArray::from_slice(&key[32..]));

        let mut tweak = GenericArray::default();
        // zero tweak seed, as specified
        tweak_cipher.encrypt_block(&mut tweak);

        let mut prng = AesXtsPrng {
            data_cipher,
            current_tweak: tweak.into(),
            block: [0u8; 64],
            pos: 64,
        };
        prng.next_block();
        let sample = u64::from_le_bytes(prng.block[..8].try_into().unwrap());
        if !entropy_gate(sample) {
            return Err(anyhow!("AES-XTS PRNG failed entropy gate on initialization"));
        }
        prng.pos = 0;
        Ok(prng)
    }

    fn next_block(&mut self) {
        // Two 16-byte AES-XTS sub-blocks make up one 32-byte XTS "sector unit"; we treat
        // each 16-byte chunk as its own XTS block sharing a doubled tweak so 64 bytes of
        // keystream come from four tweak-shifted blocks.
        for chunk in 0..4 {
            let tweak = self.current_tweak;
            let mut pt = [0u8; 16];
            for i in 0..16 {
                pt[i] ^= tweak[i];
            }
            let mut block = GenericArray::clone_from_slice(&pt);
            self.data_cipher.encrypt_block(&mut block);
            for i in 0..16 {
                block[i] ^= tweak[i];
            }
            self.block[chunk * 16..chunk * 16 + 16].copy_from_slice(&block);
            self.current_tweak = gf128_double(self.current_tweak);
        }
    }
}

fn gf128_double(mut block: [u8; 16]) -> [u8; 16] {
    let mut carry = 0u8;
    for byte in block.iter_mut() {
        let new_carry = *byte >> 7;
        *byte = (*byte << 1) | carry;
        carry = new_carry;
    }
    if carry != 0 {
        block[0] ^= 0x87;
    }
    block
}

impl WipePrng for AesXtsPrng {
    fn fill(&mut self, out: &mut [u8]) {
        let mut written = 0;
        while written < out.len() {
            if self.pos >= 64 {
                self.next_block();
                self.pos = 0;
            }
            let take = (64 - self.pos).min(out.len() - written);
            out[written..written + take].copy_from_slice(&self.block[self.pos..self.pos + take]);
            self.pos += take;
            written += take;
        }
    }

    fn snapshot(&self) -> Box<dyn WipePrng> {
        Box::new(self.clone())
    }
}

/// Ascon-PRF v1.3 variant-6: a sponge over the 320-bit Ascon permutation state.
#[derive(Clone)]
pub struct AsconPrf {
    state: [u64; 5],
    block: [u8; 40],
    pos: usize,
}

/// Ascon-PRF (variant-6) initialization vector, fixed by the Ascon specification.
const ASCON_PRF_IV: u64 = 0x80808c0000000080;

impl AsconPrf {
    /// Seeds the generator and runs its first output block through the entropy gate
    /// (§4.8) before releasing it for use.
    pub fn seed(seed: &[u8]) -> Result<Self> {
        let mut key = [0u8; 16];
        let n = seed.len().min(16);
        key[..n].copy_from_slice(&seed[..n]);
        let k0 = u64::from_be_bytes(key[0..8].try_into().unwrap());
        let k1 = u64::from_be_bytes(key[8..16].try_into().unwrap());

        let mut state = [ASCON_PRF_IV, k0, k1, 0, 0];
        permute_12(&mut state);
        state[3] ^= k0;
        state[4] ^= k1;

        let mut prf = AsconPrf {
            state,
            block: [0u8; 40],
            pos: 40,
        };
        prf.squeeze();
        let sample = u64::from_be_bytes(prf.block[..8].try_into().unwrap());
        if !entropy_gate(sample) {
            return Err(anyhow!("Ascon-PRF PRNG failed entropy gate on initialization"));
        }
        prf.pos = 0;
        Ok(prf)
    }

    fn squeeze(&mut self) {
        for i in 0..5 {
            self.block[i * 8..i * 8 + 8].copy_from_slice(&self.state[i].to_be_bytes());
        }
        permute_12(&mut self.state);
    }
}

impl WipePrng for AsconPrf {
    fn fill(&mut self, out: &mut [u8]) {
        let mut written = 0;
        while written < out.len() {
            if self.pos >= 40 {
                self.squeeze();
                self.pos = 0;
            }
            let take = (40 - self.pos).min(out.len() - written);
            out[written..written + take].copy_from_slice(&self.block[self.pos..self.pos + take]);
            self.pos += take;
            written += take;
        }
    }

    fn snapshot(&self) -> Box<dyn WipePrng> {
        Box::new(self.clone())
    }
}

/// The 12 Ascon round constants, used during the P12 permutation.
const ROUND_CONSTANTS: [u64; 12] = [
    0xf0, 0xe1, 0xd2, 0xc3, 0xb4, 0xa5, 0x96, 0x87, 0x78, 0x69, 0x5a, 0x4b,
];

fn permute_12(state: &mut [u64; 5]) {
    for rc in ROUND_CONSTANTS.iter() {
        ascon_round(state, *rc);
    }
}

fn ascon_round(s: &mut [u64; 5], round_constant: u64) {
    // addition of round constant
    s[2] ^= round_constant;

    // substitution layer (5-bit S-box applied bit-sliced across the lanes)
    s[0] ^= s[4];
    s[4] ^= s[3];
    s[2] ^= s[1];
    let t0 = s[0];
    let t1 = s[1];
    let t2 = s[2];
    let t3 = s[3];
    let t4 = s[4];
    s[0] = t0 ^ (!t1 & t2);
    s[1] = t1 ^ (!t2 & t3);
    s[2] = t2 ^ (!t3 & t4);
    s[3] = t3 ^ (!t4 & t0);
    s[4] = t4 ^ (!t0 & t1);
    s[1] ^= s[0];
    s[0] ^= s[4];
    s[3] ^= s[2];
    s[2] = !s[2];

    // linear diffusion layer
    s[0] ^= s[0].rotate_right(19) ^ s[0].rotate_right(28);
    s[1] ^= s[1].rotate_right(61) ^ s[1].rotate_right(39);
    s[2] ^= s[2].rotate_right(1) ^ s[2].rotate_right(6);
    s[3] ^= s[3].rotate_right(10) ^ s[3].rotate_right(17);
    s[4] ^= s[4].rotate_right(7) ^ s[4].rotate_right(41);
}
