//! Route table: resolves a callback identifier to one handler
//!
//! Precedence is fixed by match kind, not by registration order:
//! resolution cache, then exact keys, then prefixes (longest first), then
//! patterns (in registration order, anchored at the start of the identifier).

use dashmap::DashMap;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use strum::{AsRefStr, Display};

use super::handler::Handler;
use crate::core::config::routing::slow_route_threshold;
use crate::core::error::AppResult;
use crate::core::metrics;

/// Which rule group answered a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MatchKind {
    Cache,
    Exact,
    Prefix,
    Pattern,
}

/// A resolved handler and how it was found.
#[derive(Clone)]
pub struct Resolution {
    pub handler: Handler,
    pub kind: MatchKind,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Snapshot of routing statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingStats {
    pub registered: usize,
    pub requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub unresolved: u64,
    /// Cache hits as a percentage of requests
    pub hit_rate: f64,
    pub avg_latency: Duration,
    pub cache_size: usize,
}

impl fmt::Display for RoutingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "routes={} requests={} hits={} misses={} unresolved={} hit_rate={:.1}% avg={:?} cached={}",
            self.registered,
            self.requests,
            self.cache_hits,
            self.cache_misses,
            self.unresolved,
            self.hit_rate,
            self.avg_latency,
            self.cache_size
        )
    }
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    unresolved: AtomicU64,
    latency_nanos: AtomicU64,
}

/// Callback routing table.
///
/// Rules are registered through `&mut self` while the table is built, then
/// the table is shared behind an `Arc`. Resolution only needs `&self`: the
/// cache is a `DashMap` and statistics are atomics.
#[derive(Default)]
pub struct RouteTable {
    exact: HashMap<String, Handler>,
    /// Sorted by prefix length, longest first
    prefixes: Vec<(String, Handler)>,
    patterns: Vec<(Regex, Handler)>,
    cache: DashMap<String, Handler>,
    counters: Counters,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a literal identifier. A later registration of the same key wins.
    pub fn register_exact(&mut self, key: impl Into<String>, handler: Handler) {
        self.exact.insert(key.into(), handler);
        self.cache.clear();
    }

    /// Registers a prefix rule. Re-registering a prefix replaces its handler.
    pub fn register_prefix(&mut self, prefix: impl Into<String>, handler: Handler) {
        let prefix = prefix.into();
        if let Some(slot) = self.prefixes.iter_mut().find(|(p, _)| *p == prefix) {
            slot.1 = handler;
        } else {
            let at = self.prefixes.partition_point(|(p, _)| p.len() >= prefix.len());
            self.prefixes.insert(at, (prefix, handler));
        }
        self.cache.clear();
    }

    /// Registers a regular expression rule, matched from the first character
    /// of the identifier.
    pub fn register_pattern(&mut self, pattern: &str, handler: Handler) -> AppResult<()> {
        let regex = Regex::new(&format!("^(?:{})", pattern))?;
        self.patterns.push((regex, handler));
        self.cache.clear();
        Ok(())
    }

    /// Resolves `id`, updating statistics. A miss is `None`, never an error.
    pub fn resolve(&self, id: &str) -> Option<Resolution> {
        let start = Instant::now();
        let resolution = self.lookup(id);
        let elapsed = start.elapsed();

        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        self.counters
            .latency_nanos
            .fetch_add(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX), Ordering::Relaxed);

        match &resolution {
            Some(found) => metrics::record_resolution(found.kind.as_ref()),
            None => metrics::record_resolution("miss"),
        }
        if elapsed > slow_route_threshold() {
            log::warn!("Slow route resolution for '{}': {:?}", id, elapsed);
            metrics::SLOW_ROUTES_TOTAL.inc();
        }
        resolution
    }

    fn lookup(&self, id: &str) -> Option<Resolution> {
        let cached = self.cache.get(id).map(|entry| Arc::clone(entry.value()));
        if let Some(handler) = cached {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Some(Resolution {
                handler,
                kind: MatchKind::Cache,
            });
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        match self.find(id) {
            Some((handler, kind)) => {
                if kind != MatchKind::Exact {
                    self.cache.insert(id.to_string(), Arc::clone(&handler));
                }
                Some(Resolution { handler, kind })
            }
            None => {
                self.counters.unresolved.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Rule lookup without cache or statistics.
    fn find(&self, id: &str) -> Option<(Handler, MatchKind)> {
        if let Some(handler) = self.exact.get(id) {
            return Some((Arc::clone(handler), MatchKind::Exact));
        }
        if let Some((_, handler)) = self.prefixes.iter().find(|(prefix, _)| id.starts_with(prefix.as_str())) {
            return Some((Arc::clone(handler), MatchKind::Prefix));
        }
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(id))
            .map(|(_, handler)| (Arc::clone(handler), MatchKind::Pattern))
    }

    /// Warms the cache with `ids`; returns how many resolve to a handler.
    ///
    /// Does not count as traffic. Exact keys are counted but not cached.
    pub fn preload(&self, ids: &[&str]) -> usize {
        let mut resolved = 0;
        for id in ids {
            match self.find(id) {
                Some((handler, kind)) => {
                    if kind != MatchKind::Exact {
                        self.cache.insert((*id).to_string(), handler);
                    }
                    resolved += 1;
                }
                None => log::debug!("Preload: no route for '{}'", id),
            }
        }
        log::debug!("Preloaded {}/{} routes", resolved, ids.len());
        resolved
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn reset_stats(&self) {
        for counter in [
            &self.counters.requests,
            &self.counters.cache_hits,
            &self.counters.cache_misses,
            &self.counters.unresolved,
            &self.counters.latency_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Drops the cache and the statistics; registered rules stay.
    pub fn clear(&self) {
        self.clear_cache();
        self.reset_stats();
    }

    pub fn registered(&self) -> usize {
        self.exact.len() + self.prefixes.len() + self.patterns.len()
    }

    pub fn stats(&self) -> RoutingStats {
        let requests = self.counters.requests.load(Ordering::Relaxed);
        let cache_hits = self.counters.cache_hits.load(Ordering::Relaxed);
        let latency = self.counters.latency_nanos.load(Ordering::Relaxed);

        let (hit_rate, avg_latency) = if requests == 0 {
            (0.0, Duration::ZERO)
        } else {
            (
                cache_hits as f64 / requests as f64 * 100.0,
                Duration::from_nanos(latency / requests),
            )
        };

        RoutingStats {
            registered: self.registered(),
            requests,
            cache_hits,
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            unresolved: self.counters.unresolved.load(Ordering::Relaxed),
            hit_rate,
            avg_latency,
            cache_size: self.cache.len(),
        }
    }

    /// Registered rules as `(kind, rule)`, in resolution order within each kind.
    pub fn rules(&self) -> Vec<(MatchKind, String)> {
        let mut exact: Vec<&String> = self.exact.keys().collect();
        exact.sort();

        exact
            .into_iter()
            .map(|key| (MatchKind::Exact, key.clone()))
            .chain(self.prefixes.iter().map(|(p, _)| (MatchKind::Prefix, p.clone())))
            .chain(self.patterns.iter().map(|(r, _)| (MatchKind::Pattern, r.as_str().to_string())))
            .collect()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("exact", &self.exact.len())
            .field("prefixes", &self.prefixes.len())
            .field("patterns", &self.patterns.len())
            .field("cache_size", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::handler_fn;
    use pretty_assertions::assert_eq;

    fn noop() -> Handler {
        handler_fn(|_, _| async { Ok(()) })
    }

    #[test]
    fn test_prefixes_kept_longest_first() {
        let mut table = RouteTable::new();
        table.register_prefix("task_", noop());
        table.register_prefix("task_edit_name_", noop());
        table.register_prefix("task_edit_", noop());
        table.register_prefix("task_edit_", noop());

        let prefixes: Vec<String> = table
            .rules()
            .into_iter()
            .filter(|(kind, _)| *kind == MatchKind::Prefix)
            .map(|(_, p)| p)
            .collect();
        assert_eq!(prefixes, vec!["task_edit_name_", "task_edit_", "task_"]);
        assert_eq!(table.registered(), 3);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let mut table = RouteTable::new();
        assert!(table.register_pattern("(unclosed", noop()).is_err());
        assert_eq!(table.registered(), 0);
    }

    #[test]
    fn test_pattern_is_start_anchored_only() {
        let mut table = RouteTable::new();
        table.register_pattern(r"len_\d+", noop()).unwrap();
        assert_eq!(table.resolve("len_10_3").map(|r| r.kind), Some(MatchKind::Pattern));
        assert!(table.resolve("xlen_10").is_none());
    }

    #[test]
    fn test_stats_and_reset() {
        let mut table = RouteTable::new();
        table.register_exact("task_list", noop());
        table.register_prefix("task_view_", noop());

        assert_eq!(table.resolve("task_list").map(|r| r.kind), Some(MatchKind::Exact));
        assert_eq!(table.resolve("task_view_1").map(|r| r.kind), Some(MatchKind::Prefix));
        assert_eq!(table.resolve("task_view_1").map(|r| r.kind), Some(MatchKind::Cache));
        assert!(table.resolve("nope").is_none());

        let stats = table.stats();
        assert_eq!(stats.requests, 4);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 3);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.cache_size, 1);
        assert!((stats.hit_rate - 25.0).abs() < f64::EPSILON);

        table.clear();
        let stats = table.stats();
        assert_eq!(stats.requests, 0);
        assert_eq!(stats.cache_size, 0);
        assert_eq!(stats.registered, 2);
    }

    #[test]
    fn test_preload_does_not_count_requests() {
        let mut table = RouteTable::new();
        table.register_exact("task_list", noop());
        table.register_prefix("task_view_", noop());

        assert_eq!(table.preload(&["task_list", "task_view_1", "unknown"]), 2);
        let stats = table.stats();
        assert_eq!(stats.requests, 0);
        assert_eq!(stats.cache_size, 1);

        assert_eq!(table.resolve("task_view_1").map(|r| r.kind), Some(MatchKind::Cache));
    }
}
