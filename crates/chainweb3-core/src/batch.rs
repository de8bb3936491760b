//! Positional outcome of a flushed batch.
//!
//! Slot `i` always holds the outcome of the `i`-th request queued between
//! `batch(true)` and `execute`, whatever order the node answered in.

use serde_json::Value;

use crate::error::Web3Error;

/// Per-slot results of one batch dispatch, in submission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResponse {
    slots: Vec<Result<Value, Web3Error>>,
}

impl BatchResponse {
    pub fn new(slots: Vec<Result<Value, Web3Error>>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Result<Value, Web3Error>] {
        &self.slots
    }

    /// `true` when no slot failed.
    pub fn is_all_ok(&self) -> bool {
        self.slots.iter().all(Result::is_ok)
    }

    /// Same-length result list with `null` in every failed slot.
    pub fn positional_results(&self) -> Vec<Value> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Same-length error list with `None` in every successful slot.
    pub fn positional_errors(&self) -> Vec<Option<Web3Error>> {
        self.slots.iter().map(|slot| slot.as_ref().err().cloned()).collect()
    }

    /// Successful values only, in submission order.
    pub fn succeeded(&self) -> Vec<Value> {
        self.slots.iter().filter_map(|s| s.as_ref().ok().cloned()).collect()
    }

    /// Errors only, in submission order.
    pub fn failed(&self) -> Vec<Web3Error> {
        self.slots.iter().filter_map(|s| s.as_ref().err().cloned()).collect()
    }

    /// Split into `(errors, results)` as handed to an `execute` callback.
    ///
    /// `errors` is `None` when every slot succeeded; otherwise it lists only
    /// the failed slots. `results` lists only the succeeded slots, so an
    /// all-failed batch yields an empty result list.
    pub fn into_parts(self) -> (Option<Vec<Web3Error>>, Vec<Value>) {
        let mut errors = Vec::new();
        let mut results = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            match slot {
                Ok(v) => results.push(v),
                Err(e) => errors.push(e),
            }
        }
        let errors = if errors.is_empty() { None } else { Some(errors) };
        (errors, results)
    }
}

impl IntoIterator for BatchResponse {
    type Item = Result<Value, Web3Error>;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}
