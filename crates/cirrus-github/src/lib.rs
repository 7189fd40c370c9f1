//! GitHub self-hosted runner listing for Cirrus.
//!
//! [`RunnerClient`] pages through an organization's runners, [`TtlCache`]
//! keeps the last listing for a fixed time, and [`RunnerDirectory`] combines
//! the two into a regex search returning a [`RunnerListing`].

pub mod cache;
pub mod client;
pub mod directory;
pub mod error;

pub use cache::TtlCache;
pub use client::{Runner, RunnerClient, RunnerLabel, next_page_url};
pub use directory::{RunnerDirectory, RunnerListing};
pub use error::{GithubError, Result};
