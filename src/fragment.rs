//! Content-addressed hypergraph fragments.
//!
//! Fragments are the substrate everything in graphbind operates on. A
//! fragment is either a leaf (a named symbol or a variable) or a link: an
//! n-ary edge whose targets are fragments already interned in a store.
//! Identity is a stable content hash over a canonical encoding, so two
//! structurally identical fragments always share one identifier and store
//! insertion deduplicates for free.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Recognized link kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Root of a bind query/rewrite construct.
    Bind,
    /// Ordered list of variable declarations.
    VariableList,
    /// A variable paired with a type restriction.
    TypedVariable,
    /// Conjunction of pattern clauses.
    And,
    /// Marks a clause that must be provably absent from the store.
    Absent,
    /// An n-ary relation between fragments.
    Edge,
    /// Ordered collection.
    List,
    /// Unordered collection; identity ignores child order.
    Set,
}

impl LinkKind {
    /// All recognized kinds.
    pub const ALL: [Self; 8] = [
        Self::Bind,
        Self::VariableList,
        Self::TypedVariable,
        Self::And,
        Self::Absent,
        Self::Edge,
        Self::List,
        Self::Set,
    ];

    /// Returns true if child order does not contribute to identity.
    #[must_use]
    pub const fn is_unordered(self) -> bool {
        matches!(self, Self::Set)
    }

    /// Human-readable kind name, as used by type restrictions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bind => "Bind",
            Self::VariableList => "VariableList",
            Self::TypedVariable => "TypedVariable",
            Self::And => "And",
            Self::Absent => "Absent",
            Self::Edge => "Edge",
            Self::List => "List",
            Self::Set => "Set",
        }
    }

    /// Looks up a kind by its name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Stable single-byte tag used in the canonical hash encoding.
    const fn tag(self) -> u8 {
        match self {
            Self::Bind => 0x10,
            Self::VariableList => 0x11,
            Self::TypedVariable => 0x12,
            Self::And => 0x13,
            Self::Absent => 0x14,
            Self::Edge => 0x15,
            Self::List => 0x16,
            Self::Set => 0x17,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returns true if `name` names a fragment kind usable in type restrictions.
///
/// Known names are `"Symbol"`, `"Variable"`, and every [`LinkKind`] name.
#[must_use]
pub fn is_known_type_name(name: &str) -> bool {
    name == "Symbol" || name == "Variable" || LinkKind::from_name(name).is_some()
}

/// Stable content hash identifying a fragment.
///
/// Computed with blake3 over a canonical, domain-tagged encoding. Two
/// fragments have the same id exactly when they are structurally identical;
/// for unordered links, permuting the children does not change the id.
///
/// The display and serialization form is 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId([u8; 32]);

impl FragmentId {
    /// Wraps raw hash bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parses the 64-character lowercase hex form.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            bytes[i] = u8::try_from(hi * 16 + lo).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for FragmentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FragmentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fragment id: {s}")))
    }
}

/// A node or hyperedge.
///
/// Links reference their targets by [`FragmentId`]; the targets are owned by
/// the store, not by the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fragment {
    /// Named constant leaf.
    Symbol {
        /// Symbol name.
        name: String,
    },
    /// Variable leaf, conventionally `$`-prefixed.
    Variable {
        /// Variable name.
        name: String,
    },
    /// An n-ary edge over already-interned fragments.
    Link {
        /// Link kind.
        kind: LinkKind,
        /// Target fragment ids.
        outgoing: Vec<FragmentId>,
    },
}

impl Fragment {
    /// Creates a symbol leaf.
    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol { name: name.into() }
    }

    /// Creates a variable leaf.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    /// Creates a link.
    #[must_use]
    pub fn link(kind: LinkKind, outgoing: Vec<FragmentId>) -> Self {
        Self::Link { kind, outgoing }
    }

    /// Returns true for symbol leaves.
    #[must_use]
    pub const fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol { .. })
    }

    /// Returns true for variable leaves.
    #[must_use]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Variable { .. })
    }

    /// Returns true for links.
    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. })
    }

    /// The leaf name, if this is a symbol or variable.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Symbol { name } | Self::Variable { name } => Some(name),
            Self::Link { .. } => None,
        }
    }

    /// The link kind, if this is a link.
    #[must_use]
    pub const fn kind(&self) -> Option<LinkKind> {
        match self {
            Self::Link { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The outgoing targets (empty for leaves).
    #[must_use]
    pub fn outgoing(&self) -> &[FragmentId] {
        match self {
            Self::Link { outgoing, .. } => outgoing,
            _ => &[],
        }
    }

    /// Kind name used by type restrictions: `"Symbol"`, `"Variable"`, or the
    /// link kind name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Symbol { .. } => "Symbol",
            Self::Variable { .. } => "Variable",
            Self::Link { kind, .. } => kind.name(),
        }
    }

    /// Computes the content id over the canonical encoding.
    ///
    /// Leaves are domain-tagged and length-prefixed so a symbol and a
    /// variable with the same name never collide. Unordered link kinds sort
    /// their children before hashing.
    #[must_use]
    pub fn id(&self) -> FragmentId {
        let mut hasher = blake3::Hasher::new();
        match self {
            Self::Symbol { name } => {
                hasher.update(&[0x01]);
                hasher.update(&(name.len() as u64).to_le_bytes());
                hasher.update(name.as_bytes());
            }
            Self::Variable { name } => {
                hasher.update(&[0x02]);
                hasher.update(&(name.len() as u64).to_le_bytes());
                hasher.update(name.as_bytes());
            }
            Self::Link { kind, outgoing } => {
                hasher.update(&[0x03, kind.tag()]);
                hasher.update(&(outgoing.len() as u64).to_le_bytes());
                if kind.is_unordered() {
                    let mut sorted: Vec<&FragmentId> = outgoing.iter().collect();
                    sorted.sort();
                    for child in sorted {
                        hasher.update(child.as_bytes());
                    }
                } else {
                    for child in outgoing {
                        hasher.update(child.as_bytes());
                    }
                }
            }
        }
        FragmentId(*hasher.finalize().as_bytes())
    }
}
