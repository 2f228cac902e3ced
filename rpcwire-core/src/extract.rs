//! Path-based extraction from a response result
//!
//! Pulling one field out of a large result should not require a typed
//! decode of the whole payload. The first path query parses the raw result
//! into a [`serde_json::Value`] tree, caches it on the response, and every
//! later query walks the cached tree.
//!
//! Path segments are object keys; a segment that parses as an unsigned
//! integer indexes into an array. An empty path addresses the whole result.
//!
//! ```rust
//! use rpcwire_core::{Response, WireMessage};
//!
//! let resp = Response::decode(
//!     br#"{"jsonrpc":"2.0","id":1,"result":{"blocks":[{"hash":"0xab","size":12}]}}"#,
//! ).unwrap();
//!
//! assert_eq!(resp.extract_string(&["blocks", "0", "hash"]).unwrap(), "0xab");
//! assert_eq!(resp.extract_i64(&["blocks", "0", "size"]).unwrap(), 12);
//! ```

use crate::envelope::kind_of;
use crate::error::{Error, Result};
use crate::response::Response;
use serde_json::Value;
use std::borrow::Cow;

impl Response {
    /// The result as a cached tree view, built on first call.
    ///
    /// The envelope tokenizer does not range-check numbers, so a result such
    /// as `{"x":1e400}` decodes fine but fails here with
    /// [`Error::MalformedJson`]. The failure is cached like a success.
    pub fn result_value(&self) -> Result<&Value> {
        let raw = self.result_span()?;
        let tree = self.tree.get_or_init(|| {
            tracing::trace!(len = raw.get().len(), "building result tree");
            serde_json::from_str(raw.get()).map_err(|e| {
                tracing::warn!(error = %e, "result span failed to parse");
                e.to_string()
            })
        });
        tree.as_ref().map_err(|msg| Error::MalformedJson(msg.clone()))
    }

    /// JSON text of the value at `path`.
    ///
    /// The empty path returns the result bytes verbatim; deeper paths are
    /// re-encoded compactly from the tree view.
    pub fn extract_raw(&self, path: &[&str]) -> Result<Cow<'_, str>> {
        if path.is_empty() {
            return Ok(Cow::Borrowed(self.result_span()?.get()));
        }
        let node = self.lookup(path)?;
        Ok(Cow::Owned(serde_json::to_string(node)?))
    }

    /// String at `path`
    pub fn extract_string(&self, path: &[&str]) -> Result<&str> {
        let node = self.lookup(path)?;
        node.as_str().ok_or_else(|| mismatch(path, "string", node))
    }

    /// Integer at `path`
    pub fn extract_i64(&self, path: &[&str]) -> Result<i64> {
        let node = self.lookup(path)?;
        node.as_i64().ok_or_else(|| mismatch(path, "integer", node))
    }

    /// Number at `path`
    pub fn extract_f64(&self, path: &[&str]) -> Result<f64> {
        let node = self.lookup(path)?;
        node.as_f64().ok_or_else(|| mismatch(path, "number", node))
    }

    /// Boolean at `path`
    pub fn extract_bool(&self, path: &[&str]) -> Result<bool> {
        let node = self.lookup(path)?;
        node.as_bool().ok_or_else(|| mismatch(path, "boolean", node))
    }

    fn lookup(&self, path: &[&str]) -> Result<&Value> {
        let mut node = self.result_value()?;
        for (depth, segment) in path.iter().enumerate() {
            let next = match node {
                Value::Object(map) => map.get(*segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            node = next.ok_or_else(|| Error::PathNotFound(path[..=depth].join(".")))?;
        }
        Ok(node)
    }
}

fn mismatch(path: &[&str], expected: &'static str, found: &Value) -> Error {
    Error::TypeMismatch {
        path: path.join("."),
        expected,
        found: kind_of(found),
    }
}
