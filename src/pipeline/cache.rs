//! In-memory cache for finished pipeline runs.
//!
//! An injectable component rather than module-level state: bounded size
//! with evict-oldest-by-insertion, an optional TTL (off by default, the
//! "optimized" deployment enables it via configuration), and a `Mutex`
//! because requests run on a multi-threaded runtime.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::info;

use super::types::{FinalRecommendation, SurveyInput, UserProfile};

/// One cached pipeline result.
#[derive(Debug, Clone)]
pub struct CachedRun {
    pub recommendations: Vec<FinalRecommendation>,
    pub profile: UserProfile,
}

struct Entry {
    value: CachedRun,
    inserted_at: Instant,
}

struct Inner {
    map: HashMap<String, Entry>,
    order: VecDeque<String>,
}

pub struct RecommendationCache {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl RecommendationCache {
    /// `ttl: None` keeps entries until they are evicted by capacity.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedRun> {
        let mut inner = self.inner.lock().unwrap();
        let expired = match inner.map.get(key) {
            Some(entry) => match self.ttl {
                Some(ttl) => entry.inserted_at.elapsed() >= ttl,
                None => false,
            },
            None => return None,
        };
        if expired {
            inner.map.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }
        inner.map.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: String, value: CachedRun) {
        let mut inner = self.inner.lock().unwrap();
        if inner.map.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        }
        inner.order.push_back(key.clone());
        inner.map.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );

        while inner.map.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.map.remove(&oldest);
                    info!("recommendation cache evicted oldest entry");
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache key: normalized JSON of the preference-bearing survey fields.
/// Strings are trimmed and lowercased, lists sorted, field order fixed, so
/// equivalent surveys collide regardless of answer order or casing.
pub fn cache_key(survey: &SurveyInput) -> String {
    let norm = |s: &str| s.trim().to_lowercase();
    let norm_list = |items: &[String]| {
        let mut list: Vec<String> = items.iter().map(|s| norm(s)).collect();
        list.sort();
        list
    };

    serde_json::json!({
        "mode": survey.mode.as_str(),
        "genres": norm_list(&survey.genres),
        "mood": norm(&survey.mood),
        "goal": norm(&survey.goal),
        "films": norm_list(&survey.films),
        "triggers": norm_list(&survey.triggers),
        "filmConnection": survey.film_connection.as_deref().map(norm),
    })
    .to_string()
}
