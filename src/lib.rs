//! # ctscrape
//!
//! Pulls every ClinicalTrials.gov study matching a fixed substance query
//! into a single CSV file.
//!
//! The search API only exposes a total result count and a `min_rnk`/`max_rnk`
//! window, so the crate walks the result set one window at a time,
//! accumulates the nested study records, flattens them into a rectangular
//! table and writes it under a timestamped name.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────┐   ┌──────────┐
//! │  Query   │──▶│ Aggregation  │──▶│  Flatten  │──▶│   CSV    │
//! │ (expr)   │   │    Loop      │   │ (leaves)  │   │  output  │
//! └──────────┘   └──────┬───────┘   └───────────┘   └──────────┘
//!                       │ one window at a time
//!                       ▼
//!                ┌──────────────┐
//!                │ HttpFetcher  │
//!                └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ctscrape 01/01/2020 12/31/2020 --dir ./data --filename psychedelics
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`query`] | Substance vocabulary and search expression |
//! | [`fetch`] | Single-window API requests |
//! | [`aggregate`] | Pagination loop |
//! | [`flatten`] | Nested records → table |
//! | [`output`] | Output validation and CSV writing |
//! | [`scrape`] | End-to-end orchestration |

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod models;
pub mod output;
pub mod progress;
pub mod query;
pub mod scrape;
