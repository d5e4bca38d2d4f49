use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Number of bits holding the random part of an asset id
pub const BASE_ID_BITS: u32 = 56;
/// Number of bits holding the asset type
pub const TYPE_BITS: u32 = 8;
pub const BASE_ID_MASK: u64 = (1 << BASE_ID_BITS) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssetType {
    Invalid = 0,
    Texture = 1,
    Mesh = 2,
    Audio = 3,
    Material = 4,
    Scene = 5,
    Script = 6,
}

impl AssetType {
    pub const ALL: [AssetType; 7] = [
        AssetType::Invalid,
        AssetType::Texture,
        AssetType::Mesh,
        AssetType::Audio,
        AssetType::Material,
        AssetType::Scene,
        AssetType::Script,
    ];

    /// Unknown type codes are treated as invalid.
    pub fn from_u8(value: u8) -> AssetType {
        match value {
            1 => AssetType::Texture,
            2 => AssetType::Mesh,
            3 => AssetType::Audio,
            4 => AssetType::Material,
            5 => AssetType::Scene,
            6 => AssetType::Script,
            _ => AssetType::Invalid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Invalid => "invalid",
            AssetType::Texture => "texture",
            AssetType::Mesh => "mesh",
            AssetType::Audio => "audio",
            AssetType::Material => "material",
            AssetType::Scene => "scene",
            AssetType::Script => "script",
        }
    }

    /// Guess the asset type from a source file extension (case-insensitive).
    pub fn from_extension(extension: &str) -> Option<AssetType> {
        match extension.to_ascii_lowercase().as_str() {
            "dds" | "png" | "jpg" | "jpeg" | "tga" | "bmp" => Some(AssetType::Texture),
            "fbx" | "obj" | "gltf" | "glb" => Some(AssetType::Mesh),
            "wav" | "ogg" | "flac" | "mp3" => Some(AssetType::Audio),
            "material" | "xmat" => Some(AssetType::Material),
            "scene" | "xscn" => Some(AssetType::Scene),
            "lua" => Some(AssetType::Script),
            _ => None,
        }
    }
}

impl Default for AssetType {
    fn default() -> Self {
        AssetType::Invalid
    }
}

impl Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .iter()
            .copied()
            .filter(|t| *t != AssetType::Invalid)
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown asset type: {}", s))
    }
}

/// 64-bit asset identifier: the asset type in the top 8 bits,
/// an opaque random base id in the low 56 bits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    pub fn from_raw(raw: u64) -> AssetId {
        AssetId(raw)
    }

    /// Combines a type and a base id. Bits of `base_id` above the 56-bit range are dropped.
    pub fn new(asset_type: AssetType, base_id: u64) -> AssetId {
        AssetId(((asset_type as u64) << BASE_ID_BITS) | (base_id & BASE_ID_MASK))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn type_code(&self) -> u8 {
        (self.0 >> BASE_ID_BITS) as u8
    }

    pub fn asset_type(&self) -> AssetType {
        AssetType::from_u8(self.type_code())
    }

    pub fn base_id(&self) -> u64 {
        self.0 & BASE_ID_MASK
    }
}

impl From<u64> for AssetId {
    fn from(raw: u64) -> Self {
        AssetId(raw)
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates asset ids from an explicitly owned random source.
/// There is no collision detection: two calls may in principle
/// return the same base id.
pub struct IdGenerator<R: RngCore = StdRng> {
    rng: R,
}

impl IdGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        IdGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        IdGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: RngCore> IdGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        IdGenerator { rng }
    }

    pub fn generate(&mut self, asset_type: AssetType) -> AssetId {
        let base_id = self.rng.gen::<u64>() & BASE_ID_MASK;
        AssetId::new(asset_type, base_id)
    }
}
