/// Data layer: core types, loading, searching, filtering, counting, export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet  (file or uploaded bytes)
///        │
///        ▼
///   ┌──────────────────┐
///   │ loader+normalize │  parse file → Dataset, clean known columns
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────────┐
///   │ Dataset  │ ───▶ │ SearchIndex  │  lowercase haystack per record
///   └──────────┘      └──────────────┘
///        │                   │
///        ▼                   ▼
///   ┌──────────────────────────┐
///   │ filter                   │  text ∧ categories → record indices
///   └──────────────────────────┘
///        │
///        ├──▶ aggregate   value counts per chart column
///        └──▶ export      write the view back out
/// ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod search;
