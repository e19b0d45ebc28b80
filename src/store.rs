use bytes::Bytes;
use itertools::Itertools;
use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error as ThisError;

/// Separator used when a list is rendered as a single string value.
pub const LIST_DELIMITER: u8 = b'\t';

/// The Store is responsible for managing key-value pairs, with optional expiration deadlines for
/// each key. Expired keys are never swept in the background: they are removed lazily the next
/// time a lookup observes them.
///
/// The whole key space sits behind a single mutex. Every operation is a short critical section
/// that takes the lock through [`InnerStore::lock`], so concurrent commands never interleave.
/// The store is cheap to clone, clones share the same key space.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new() -> Store {
        let state = State {
            keys: HashMap::new(),
        };

        let inner = Arc::new(InnerStore {
            state: Mutex::new(state),
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InnerStore {
    state: Mutex<State>,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("value is not an integer or out of range")]
    NotAnInteger,
}

impl<'a> InnerStoreLocked<'a> {
    /// Overwrites `key` wholesale. `expires_at` is an absolute unix timestamp in milliseconds,
    /// `None` keeps the key forever.
    pub fn set(&mut self, key: String, data: Bytes, expires_at: Option<i64>) {
        let value = Value {
            data: Data::Plain(data),
            expires_at,
        };
        self.state.keys.insert(key, value);
    }

    /// Returns the value stored at `key`. Lists are rendered as their elements joined by
    /// [`LIST_DELIMITER`].
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        self.live(key).map(|value| value.data.render())
    }

    /// Counts how many of `keys` are present. Repeated keys are counted every time.
    pub fn exists(&mut self, keys: &[String]) -> usize {
        keys.iter().filter(|key| self.live(key).is_some()).count()
    }

    /// Removes every key in `keys`, returning how many were actually removed.
    pub fn delete(&mut self, keys: &[String]) -> usize {
        keys.iter()
            .filter(|key| {
                self.live(key).is_some() && self.state.keys.remove(key.as_str()).is_some()
            })
            .count()
    }

    /// Adds `delta` to the integer stored at `key`, starting from zero when the key is missing.
    /// Any previous expiration is dropped.
    pub fn atomic_delta(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let current = match self.live(key) {
            Some(value) => value.data.as_integer()?,
            None => 0,
        };

        let value = current
            .checked_add(delta)
            .ok_or(StoreError::NotAnInteger)?;

        self.set(key.to_string(), value.to_string().into(), None);

        Ok(value)
    }

    /// Pushes `values` onto the list at `key`, creating it when missing. When `prepend` is set
    /// the values are pushed to the front one by one, so the last one ends up first.
    ///
    /// Returns how many values were pushed by this call, not the length of the list.
    pub fn list_push(&mut self, key: &str, values: Vec<Bytes>, prepend: bool) -> usize {
        let pushed = values.len();

        let mut list = if self.live(key).is_some() {
            self.state
                .keys
                .remove(key)
                .map(|value| value.data.into_list())
                .unwrap_or_default()
        } else {
            VecDeque::with_capacity(pushed)
        };

        for value in values {
            if prepend {
                list.push_front(value);
            } else {
                list.push_back(value);
            }
        }

        let value = Value {
            data: Data::List(list),
            expires_at: None,
        };
        self.state.keys.insert(key.to_string(), value);

        pushed
    }

    pub fn size(&self) -> usize {
        self.state.keys.len()
    }

    /// Looks up `key`, evicting it first if its deadline has passed.
    fn live(&mut self, key: &str) -> Option<&Value> {
        let expired = self
            .state
            .keys
            .get(key)
            .is_some_and(|value| value.is_expired(now_millis()));

        if expired {
            self.state.keys.remove(key);
            return None;
        }

        self.state.keys.get(key)
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        // A panic while holding the lock can't leave the map half written: every write is a
        // single insert or remove.
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        InnerStoreLocked { state }
    }
}

type Key = String;

#[derive(Debug)]
pub struct Value {
    pub data: Data,
    pub expires_at: Option<i64>,
}

impl Value {
    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug)]
pub enum Data {
    Plain(Bytes),
    List(VecDeque<Bytes>),
}

impl Data {
    fn render(&self) -> Bytes {
        match self {
            Data::Plain(bytes) => bytes.clone(),
            Data::List(items) => {
                let items = items.iter().map(|item| item.as_ref());
                Itertools::intersperse(items, &[LIST_DELIMITER][..])
                    .flatten()
                    .copied()
                    .collect::<Vec<u8>>()
                    .into()
            }
        }
    }

    fn as_integer(&self) -> Result<i64, StoreError> {
        let rendered = self.render();

        std::str::from_utf8(&rendered)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(StoreError::NotAnInteger)
    }

    // A plain value pushed to as a list is read back as its delimited elements.
    fn into_list(self) -> VecDeque<Bytes> {
        match self {
            Data::List(items) => items,
            Data::Plain(bytes) => bytes
                .split(|byte| *byte == LIST_DELIMITER)
                .map(|item| bytes.slice_ref(item))
                .collect(),
        }
    }
}

pub struct State {
    keys: HashMap<Key, Value>,
}

/// Current unix time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
