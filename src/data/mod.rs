/// Data layer: download, parsing, and date filtering.
///
/// Architecture:
/// ```text
///  https://…/18311100.txt
///        │
///        ▼
///   ┌──────────┐
///   │  fetch    │  basic auth GET → data/18311100.txt
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  `|`-delimited text → Vec<Measurement>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  inclusive DateRange → Series
///   └──────────┘
/// ```

pub mod error;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod model;
