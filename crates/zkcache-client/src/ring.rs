use std::collections::VecDeque;

use zkcache_common::protocol::{Result, ZkCacheError};

/// Cyclic ring of endpoint addresses.
///
/// The ring is fixed at construction and consumed by rotation: each call to
/// [`next_addr`](Self::next_addr) moves the cursor one position and wraps
/// around at the end.
#[derive(Debug)]
pub struct AddressRing {
    addrs: VecDeque<String>,
}

impl AddressRing {
    /// Parses a comma-separated `host:port` list, preserving order.
    ///
    /// Entries are taken verbatim; the list must be non-empty.
    pub fn parse(list: &str) -> Result<Self> {
        if list.is_empty() {
            return Err(ZkCacheError::Config(
                "Empty server address list".to_string(),
            ));
        }

        Ok(Self {
            addrs: list.split(',').map(str::to_string).collect(),
        })
    }

    /// Returns the address at the cursor and advances it cyclically.
    pub fn next_addr(&mut self) -> Option<String> {
        let addr = self.addrs.pop_front()?;
        self.addrs.push_back(addr.clone());
        Some(addr)
    }

    /// Number of configured addresses.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}
