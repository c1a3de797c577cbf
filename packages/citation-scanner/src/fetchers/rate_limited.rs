//! Rate-limited fetcher wrapper.
//!
//! Wraps any ContentFetcher with a request quota using the governor crate.
//! A traversal fans out to every cited source at once, so without a quota
//! a wide citation list turns into a burst against the same hosts.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::FetchResult;
use crate::traits::fetcher::ContentFetcher;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

fn per_second(requests: u32) -> NonZeroU32 {
    NonZeroU32::new(requests).unwrap_or(nonzero!(1u32))
}

/// A fetcher wrapper that enforces a global request rate.
pub struct RateLimitedFetcher<F> {
    inner: F,
    limiter: Arc<DefaultRateLimiter>,
}

impl<F: ContentFetcher> RateLimitedFetcher<F> {
    /// Wrap `fetcher` with a limit of `requests_per_second` (zero is treated as one).
    pub fn new(fetcher: F, requests_per_second: u32) -> Self {
        Self::with_quota(fetcher, Quota::per_second(per_second(requests_per_second)))
    }

    /// Wrap with a sustained rate and a burst allowance.
    pub fn with_burst(fetcher: F, requests_per_second: u32, burst: u32) -> Self {
        let quota =
            Quota::per_second(per_second(requests_per_second)).allow_burst(per_second(burst));
        Self::with_quota(fetcher, quota)
    }

    /// Wrap with a custom quota.
    pub fn with_quota(fetcher: F, quota: Quota) -> Self {
        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// The wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: ContentFetcher> ContentFetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        self.limiter.until_ready().await;
        self.inner.fetch(url).await
    }
}

/// Extension trait for easy rate limiting.
pub trait FetcherExt: ContentFetcher + Sized {
    /// Wrap this fetcher with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedFetcher<Self> {
        RateLimitedFetcher::new(self, requests_per_second)
    }

    /// Wrap with rate limiting and burst support.
    fn rate_limited_with_burst(
        self,
        requests_per_second: u32,
        burst: u32,
    ) -> RateLimitedFetcher<Self> {
        RateLimitedFetcher::with_burst(self, requests_per_second, burst)
    }
}

impl<F: ContentFetcher + Sized> FetcherExt for F {}
