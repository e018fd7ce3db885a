// Aggregator - Concurrent fan-out of independent reads folded into one view-model
use crate::application::errors::ClientError;
use crate::domain::envelope::ResourceEnvelope;
use futures::future::{BoxFuture, FutureExt, join_all};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

type Reducer<'a, V> = Box<dyn FnOnce(&mut V) + Send + 'a>;

struct Slice<'a, V> {
    name: &'static str,
    fetch: BoxFuture<'a, Result<Reducer<'a, V>, ClientError>>,
}

/// An ordered set of named fetch + reduce pairs.
///
/// A reducer must only write the fields belonging to its own slice; a slice
/// that fails leaves those fields at their zero value.
pub struct AggregationRequest<'a, V> {
    slices: Vec<Slice<'a, V>>,
}

impl<'a, V: 'a> Default for AggregationRequest<'a, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, V: 'a> AggregationRequest<'a, V> {
    pub fn new() -> Self {
        Self { slices: Vec::new() }
    }

    pub fn slice<T, F, R>(mut self, name: &'static str, fetch: F, reduce: R) -> Self
    where
        T: Send + 'a,
        F: Future<Output = Result<ResourceEnvelope<T>, ClientError>> + Send + 'a,
        R: FnOnce(&mut V, T) + Send + 'a,
    {
        let fetch = async move {
            let data = fetch.await?.into_data()?;
            let reducer: Reducer<'a, V> = Box::new(move |view: &mut V| reduce(view, data));
            Ok(reducer)
        }
        .boxed();

        self.slices.push(Slice { name, fetch });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceFailure {
    pub name: String,
    pub reason: String,
}

/// Folded view-model plus the slices that contributed zero values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregated<V> {
    pub view: V,
    pub failures: Vec<SliceFailure>,
    pub slice_count: usize,
}

impl<V> Aggregated<V> {
    pub fn degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn all_failed(&self) -> bool {
        self.slice_count > 0 && self.failures.len() == self.slice_count
    }

    pub fn failed_sources(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.name.clone()).collect()
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Aggregated<U> {
        Aggregated {
            view: f(self.view),
            failures: self.failures,
            slice_count: self.slice_count,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    fetch_timeout: Duration,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl Aggregator {
    pub fn new(fetch_timeout: Duration) -> Self {
        Self { fetch_timeout }
    }

    pub async fn run<'a, V>(&self, request: AggregationRequest<'a, V>) -> Aggregated<V>
    where
        V: Default + 'a,
    {
        self.run_seeded(V::default(), request).await
    }

    /// Issue every slice at once, settle each independently, then fold the
    /// successful ones into `seed`. Dropping the returned future cancels all
    /// in-flight fetches.
    pub async fn run_seeded<'a, V: 'a>(&self, seed: V, request: AggregationRequest<'a, V>) -> Aggregated<V> {
        let slice_count = request.slices.len();
        let timeout = self.fetch_timeout;

        let settled = join_all(request.slices.into_iter().map(|slice| async move {
            let outcome = match tokio::time::timeout(timeout, slice.fetch).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("timed out after {}ms", timeout.as_millis())),
            };
            (slice.name, outcome)
        }))
        .await;

        let mut view = seed;
        let mut failures = Vec::new();
        for (name, outcome) in settled {
            match outcome {
                Ok(reduce) => reduce(&mut view),
                Err(reason) => {
                    tracing::warn!(slice = name, %reason, "Slice failed, using zero value");
                    failures.push(SliceFailure {
                        name: name.to_string(),
                        reason,
                    });
                }
            }
        }

        tracing::debug!(
            "Aggregated {} slices ({} failed)",
            slice_count,
            failures.len()
        );

        Aggregated {
            view,
            failures,
            slice_count,
        }
    }
}
