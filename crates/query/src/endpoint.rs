//! Endpoint contracts. Each API call is a zero-sized type implementing
//! `Query` (cached, tag-providing) or `Mutation` (uncached, tag-invalidating).

use serde::de::DeserializeOwned;
use weedle_http::HttpRequest;

use crate::{Params, RetryTier, Tag};

pub trait Query: 'static {
    /// Unique across the client; two queries sharing a name share cache entries.
    const NAME: &'static str;
    const TIER: RetryTier;
    type Args: Send + Sync;
    type Output: DeserializeOwned + Send + Sync + 'static;

    fn request(args: &Self::Args) -> HttpRequest;

    fn params(_args: &Self::Args) -> Params { Params::new() }

    fn provides(_args: &Self::Args) -> Vec<Tag> { Vec::new() }
}

pub trait Mutation: 'static {
    const NAME: &'static str;
    const TIER: RetryTier;
    type Args: Send + Sync;
    type Output: DeserializeOwned + Send + 'static;

    fn request(args: &Self::Args) -> HttpRequest;

    fn invalidates(_args: &Self::Args) -> Vec<Tag> { Vec::new() }
}
