use bgd_graph::{Block, InputValue, Script};
use bgd_types::Fingerprint;
use serde_json::Value;

/// Domain-separated BLAKE3 tree hasher.
///
/// The domain tag is prepended to every hash computation so a block-tree
/// fingerprint can never collide with another content-addressed value of
/// identical bytes. Every hashed component is length-prefixed, ruling out
/// concatenation ambiguity between adjacent components.
///
/// A node's fingerprint covers its opcode, sorted fields, normalized
/// inputs, mutation, structural children, and the fingerprint of its
/// `next` sibling (the null fingerprint stands in for "no sibling"), so a
/// script's fingerprint is simply its root's.
pub struct TreeHasher {
    domain: &'static str,
}

impl TreeHasher {
    /// Hasher for canonical block trees.
    pub const BLOCK: Self = Self {
        domain: "bgd-block-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    /// Fingerprint a whole script.
    pub fn fingerprint_script(&self, script: &Script) -> Fingerprint {
        self.fingerprint_block(&script.root)
    }

    /// Fingerprint a block together with its following siblings.
    ///
    /// Sibling chains can be arbitrarily long, so the chain is folded
    /// iteratively from the tail; only nesting recurses.
    pub fn fingerprint_block(&self, head: &Block) -> Fingerprint {
        let chain: Vec<&Block> = head.chain().collect();
        let mut next = Fingerprint::null();
        for block in chain.into_iter().rev() {
            next = self.node_fingerprint(block, &next);
        }
        next
    }

    fn node_fingerprint(&self, block: &Block, next: &Fingerprint) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");

        segment(&mut hasher, block.opcode.as_bytes());

        hasher.update(&(block.fields.len() as u64).to_le_bytes());
        for (name, value) in &block.fields {
            segment(&mut hasher, name.as_bytes());
            segment(&mut hasher, &canonical_json(value));
        }

        hasher.update(&(block.inputs.len() as u64).to_le_bytes());
        for (name, input) in &block.inputs {
            segment(&mut hasher, name.as_bytes());
            match input {
                InputValue::Literal(value) => {
                    hasher.update(b"L");
                    segment(&mut hasher, &canonical_json(value));
                }
                InputValue::Subtree(sub) => {
                    hasher.update(b"B");
                    hasher.update(self.fingerprint_block(sub).as_bytes());
                }
            }
        }

        match &block.mutation {
            Some(mutation) => {
                hasher.update(b"M");
                segment(&mut hasher, &canonical_json(mutation));
            }
            None => {
                hasher.update(b"-");
            }
        }

        hasher.update(&(block.children.len() as u64).to_le_bytes());
        for child in &block.children {
            segment(&mut hasher, child.slot.as_bytes());
            hasher.update(self.fingerprint_block(&child.body).as_bytes());
        }

        hasher.update(next.as_bytes());
        Fingerprint::from_hash(*hasher.finalize().as_bytes())
    }
}

/// Fingerprint a script with the standard block-tree domain.
pub fn script_fingerprint(script: &Script) -> Fingerprint {
    TreeHasher::BLOCK.fingerprint_script(script)
}

fn segment(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

// Plain `Value` serialization cannot fail, and map keys serialize in
// sorted order, so this is a deterministic canonical encoding.
fn canonical_json(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}
