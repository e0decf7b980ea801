//! Key schedule for deterministic pseudonym generation.
//!
//! `K = HKDF-SHA256(secret, salt = document_scope_id)`; per-cluster keys
//! are `HMAC(K, kind || 0x1F || canonical_form)`; mention streams are
//! `HMAC(K_c, purpose || 0x1F || retry_salt)` stretched counter-mode.
//! All key material is zeroized on drop and never appears in any output.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

const MASTER_INFO: &[u8] = b"sanitext.master.v1";
const FIELD_SEP: &[u8] = &[0x1F];

/// Scope identifier for cross-document consistency.
pub const GLOBAL_SCOPE: &[u8] = b"global";

/// SHA-256 of the normalized document, used as the per-document scope id.
pub fn document_scope_id(normalized_text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(normalized_text.as_bytes());
    hasher.finalize().into()
}

fn hmac_bytes(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts any key length");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            mac.update(FIELD_SEP);
        }
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// Per-run master key.
pub struct KeyMaterial {
    master: Zeroizing<[u8; 32]>,
    seed_present: bool,
}

impl KeyMaterial {
    /// Derive the master key from the caller-provided secret. When no
    /// secret is supplied (and none is required), an ephemeral random one
    /// is drawn; determinism then holds within the run only.
    pub fn derive(secret: Option<&[u8]>, scope_id: &[u8]) -> Self {
        let seed_present = secret.is_some();
        let ikm: Zeroizing<Vec<u8>> = match secret {
            Some(bytes) => Zeroizing::new(bytes.to_vec()),
            None => {
                let mut buf = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut buf);
                Zeroizing::new(buf)
            }
        };
        let hk = Hkdf::<Sha256>::new(Some(scope_id), &ikm);
        let mut okm = Zeroizing::new([0u8; 32]);
        hk.expand(MASTER_INFO, okm.as_mut())
            .expect("32 bytes is a valid HKDF-SHA256 output length");
        Self {
            master: okm,
            seed_present,
        }
    }

    pub fn seed_present(&self) -> bool {
        self.seed_present
    }

    /// `K_c = HMAC(K, kind || canonical_form)`.
    pub fn cluster_key(&self, kind: &str, canonical_form: &str) -> ClusterKey {
        ClusterKey {
            key: Zeroizing::new(hmac_bytes(
                self.master.as_ref(),
                &[kind.as_bytes(), canonical_form.as_bytes()],
            )),
        }
    }
}

/// Per-cluster key; every pseudonym for the cluster derives from it.
pub struct ClusterKey {
    key: Zeroizing<[u8; 32]>,
}

impl ClusterKey {
    /// Deterministic stream for one purpose (a mention shape signature, an
    /// identity draw, a date offset) at a given retry salt.
    pub fn stream(&self, purpose: &str, retry_salt: u8) -> DetRng {
        let seed = hmac_bytes(
            self.key.as_ref(),
            &[purpose.as_bytes(), &[retry_salt]],
        );
        DetRng::new(seed)
    }
}

/// Deterministic byte stream: HMAC(seed, counter) blocks, consumed as
/// needed. Not a general-purpose RNG; uniformity comes from rejection
/// sampling in [`DetRng::below`].
pub struct DetRng {
    seed: Zeroizing<[u8; 32]>,
    counter: u64,
    block: [u8; 32],
    pos: usize,
}

impl DetRng {
    fn new(seed: [u8; 32]) -> Self {
        let mut rng = Self {
            seed: Zeroizing::new(seed),
            counter: 0,
            block: [0u8; 32],
            pos: 32,
        };
        rng.refill();
        rng
    }

    fn refill(&mut self) {
        self.block = hmac_bytes(self.seed.as_ref(), &[&self.counter.to_le_bytes()]);
        self.counter += 1;
        self.pos = 0;
    }

    pub fn next_u64(&mut self) -> u64 {
        if self.pos + 8 > self.block.len() {
            self.refill();
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.block[self.pos..self.pos + 8]);
        self.pos += 8;
        u64::from_le_bytes(bytes)
    }

    /// Uniform draw in `[0, n)`.
    pub fn below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "below(0) is meaningless");
        let limit = u64::MAX - (u64::MAX % n);
        loop {
            let v = self.next_u64();
            if v < limit {
                return v % n;
            }
        }
    }

    /// Uniform draw in `[lo, hi]` (inclusive).
    pub fn range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        debug_assert!(lo <= hi);
        let width = (hi - lo) as u64 + 1;
        lo + self.below(width) as i64
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }

    pub fn digit(&mut self) -> char {
        char::from(b'0' + self.below(10) as u8)
    }

    pub fn uppercase(&mut self) -> char {
        char::from(b'A' + self.below(26) as u8)
    }

    pub fn lowercase(&mut self) -> char {
        char::from(b'a' + self.below(26) as u8)
    }
}
