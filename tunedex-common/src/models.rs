//! Shared catalog data model
//!
//! Wire types for the chunked catalog layout served by the data host:
//! `{kind}-chunks/index.json` describes the chunk geometry, and
//! `{kind}-chunks/chunk_{n}.json` holds one JSON array of records each.
//! Chunk numbering is 1-based.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Error;

/// The catalog datasets tunedex knows how to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Songs,
    Artists,
    Genres,
    Styles,
}

impl CatalogKind {
    /// All known catalog kinds
    pub const ALL: [CatalogKind; 4] = [
        CatalogKind::Songs,
        CatalogKind::Artists,
        CatalogKind::Genres,
        CatalogKind::Styles,
    ];

    /// Dataset name as it appears in data paths (`songs-chunks/...`)
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Songs => "songs",
            CatalogKind::Artists => "artists",
            CatalogKind::Genres => "genres",
            CatalogKind::Styles => "styles",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "songs" => Ok(CatalogKind::Songs),
            "artists" => Ok(CatalogKind::Artists),
            "genres" => Ok(CatalogKind::Genres),
            "styles" => Ok(CatalogKind::Styles),
            other => Err(Error::InvalidInput(format!(
                "Unknown catalog kind '{}' (expected one of: songs, artists, genres, styles)",
                other
            ))),
        }
    }
}

/// One record in a catalog dataset
///
/// Catalog JSON is loosely schemaed: `id` may arrive as a string or a
/// number, the display name may be absent or non-string, and the optional
/// fields vary by dataset. Every field decodes leniently, so a record
/// with an odd field shape cannot poison a whole chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Stable record identifier, empty when the source omits one
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,

    /// Human-readable name; `None` when missing or not a string
    #[serde(
        default,
        alias = "name",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,

    /// URL-safe name used by the upstream site
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub slug: Option<String>,

    /// Number of songs under this entry (artists, genres, styles)
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub song_count: Option<u64>,

    /// Link to the upstream detail page
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
}

/// Accept a string or number id; anything else becomes empty
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Accept a string; null, numbers, and other shapes become `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Accept a non-negative integer; anything else becomes `None`
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_u64()))
}

/// Chunk geometry for one dataset, from `{kind}-chunks/index.json`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkIndex {
    /// Total number of chunks in the dataset
    pub total_chunks: usize,
    /// Records per chunk (the final chunk may be short)
    pub chunk_size: usize,
}

impl ChunkIndex {
    /// True when the geometry can be used for chunk arithmetic
    ///
    /// A zero `chunk_size` is malformed (division by zero in every
    /// position computation), so callers treat it as load failure.
    pub fn is_usable(&self) -> bool {
        self.chunk_size > 0
    }

    /// 1-based chunk number holding the record at 0-based `position`
    ///
    /// Only meaningful when `is_usable()`; callers check first.
    pub fn chunk_for(&self, position: usize) -> usize {
        position / self.chunk_size + 1
    }
}
