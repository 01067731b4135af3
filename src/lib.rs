//! # Parlament Harvest
//!
//! Incremental harvester for speech records published by the Hungarian
//! Parliament web API.
//!
//! Every fetched document is kept on local storage, so repeat runs only
//! request what is still missing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐                      ┌──────────────┐
//! │  Inventory  │  saved speeches      │   Metadata   │  listings (cached)
//! │  save_dir   │                      │  web API     │
//! └──────┬──────┘                      └──────┬───────┘
//!        └───────────────┐    ┌───────────────┘
//!                        ▼    ▼
//!                     ┌──────────┐      ┌────────────┐
//!                     │   Plan   │─────▶│  Download  │──▶ save_dir
//!                     └──────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and API key loading |
//! | [`models`] | Speech keys and grouped speech trees |
//! | [`extract`] | Id extraction and XML normalization |
//! | [`api`] | Web API seam and HTTP client |
//! | [`cache`] | Listing document cache |
//! | [`inventory`] | Local inventory from the save directory |
//! | [`metadata`] | Remote speech enumeration |
//! | [`plan`] | Download planning and resume markers |
//! | [`download`] | Fetch, retry, and persist |
//! | [`sync`] | Run orchestration |
//! | [`status`] | Local collection overview |
//! | [`progress`] | Progress reporting |

pub mod api;
pub mod cache;
pub mod config;
pub mod download;
pub mod extract;
pub mod inventory;
pub mod metadata;
pub mod models;
pub mod plan;
pub mod progress;
pub mod status;
pub mod sync;
