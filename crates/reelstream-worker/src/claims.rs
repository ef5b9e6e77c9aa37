use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Names with an upload currently in flight.
///
/// A second upload under the same name is refused until the first job's
/// [`NameClaim`] is dropped.
#[derive(Debug, Default, Clone)]
pub struct NameClaims {
    names: Arc<Mutex<HashSet<String>>>,
}

impl NameClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`, or `None` when it is already claimed.
    pub fn try_claim(&self, name: &str) -> Option<NameClaim> {
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        if !names.insert(name.to_string()) {
            return None;
        }
        Some(NameClaim {
            name: name.to_string(),
            names: Arc::clone(&self.names),
        })
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }
}

/// Exclusive hold on an asset name, released on drop.
#[derive(Debug)]
pub struct NameClaim {
    name: String,
    names: Arc<Mutex<HashSet<String>>>,
}

impl NameClaim {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameClaim {
    fn drop(&mut self) {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_exclusive_until_dropped() {
        let claims = NameClaims::new();
        let first = claims.try_claim("movie").unwrap();
        assert_eq!(first.name(), "movie");
        assert!(claims.try_claim("movie").is_none());
        assert!(claims.try_claim("other").is_some());

        drop(first);
        assert!(!claims.is_claimed("movie"));
        assert!(claims.try_claim("movie").is_some());
    }
}
