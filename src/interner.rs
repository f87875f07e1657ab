//! Canonicalizing opaque caller states to dense [`StateKey`]s.

use std::collections::HashMap;
use std::fmt;

use crate::error::{DomainError, EngineError};
use crate::keys::StateKey;

/// A token derived from an opaque caller state, used as the interner key.
/// Modelled directly as the two shapes the distilled contract allows
/// (string or byte-string) rather than as a runtime type check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenValue {
    Str(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Str(s) => write!(f, "{s}"),
            TokenValue::Bytes(b) => write!(f, "{b:?}"),
        }
    }
}

impl From<String> for TokenValue {
    fn from(s: String) -> Self {
        TokenValue::Str(s)
    }
}

impl From<&str> for TokenValue {
    fn from(s: &str) -> Self {
        TokenValue::Str(s.to_owned())
    }
}

impl From<Vec<u8>> for TokenValue {
    fn from(b: Vec<u8>) -> Self {
        TokenValue::Bytes(b)
    }
}

/// Maps opaque state tokens to dense [`StateKey`]s, and keeps the owned
/// payload + token for each key so the domain can be asked to act on a
/// `StateKey` later.
pub struct StateInterner<T> {
    payloads: Vec<T>,
    tokens: Vec<TokenValue>,
    index: HashMap<TokenValue, StateKey>,
}

impl<T: Clone + PartialEq> StateInterner<T> {
    pub fn new() -> Self {
        Self {
            payloads: Vec::new(),
            tokens: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Interns `payload` under `token`, returning its key. If the token is
    /// already known, the existing key is returned. When `check_collisions`
    /// is set, a token reused for a payload that differs from the one
    /// originally stored under it is reported as
    /// [`DomainError::TokenCollision`] instead of silently aliasing the two
    /// states.
    pub fn intern(
        &mut self,
        token: TokenValue,
        payload: T,
        check_collisions: bool,
    ) -> Result<StateKey, EngineError> {
        if let Some(&key) = self.index.get(&token) {
            if check_collisions && self.payloads[key.index()] != payload {
                return Err(EngineError::Domain(DomainError::TokenCollision {
                    token: token.to_string(),
                }));
            }
            return Ok(key);
        }
        let key = StateKey(self.payloads.len() as u32);
        self.payloads.push(payload);
        self.tokens.push(token.clone());
        self.index.insert(token, key);
        Ok(key)
    }

    pub fn payload(&self, key: StateKey) -> &T {
        &self.payloads[key.index()]
    }

    pub fn token(&self, key: StateKey) -> &TokenValue {
        &self.tokens[key.index()]
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl<T: Clone + PartialEq> Default for StateInterner<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_token_reuses_key() {
        let mut interner: StateInterner<i32> = StateInterner::new();
        let a = interner.intern(TokenValue::Str("x".into()), 1, false).unwrap();
        let b = interner.intern(TokenValue::Str("x".into()), 1, false).unwrap();
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_tokens_get_distinct_keys() {
        let mut interner: StateInterner<i32> = StateInterner::new();
        let a = interner.intern(TokenValue::Str("x".into()), 1, false).unwrap();
        let b = interner.intern(TokenValue::Str("y".into()), 2, false).unwrap();
        assert_ne!(a, b);
        assert_eq!(*interner.payload(a), 1);
        assert_eq!(*interner.payload(b), 2);
    }

    #[test]
    fn collision_check_allows_identical_payload() {
        let mut interner: StateInterner<i32> = StateInterner::new();
        interner.intern(TokenValue::Str("x".into()), 1, true).unwrap();
        let result = interner.intern(TokenValue::Str("x".into()), 1, true);
        assert!(result.is_ok());
    }

    #[test]
    fn collision_check_rejects_differing_payload() {
        let mut interner: StateInterner<i32> = StateInterner::new();
        interner.intern(TokenValue::Str("x".into()), 1, true).unwrap();
        let result = interner.intern(TokenValue::Str("x".into()), 2, true);
        assert!(matches!(
            result,
            Err(EngineError::Domain(DomainError::TokenCollision { .. }))
        ));
    }

    #[test]
    fn collision_check_disabled_silently_aliases() {
        let mut interner: StateInterner<i32> = StateInterner::new();
        let a = interner.intern(TokenValue::Str("x".into()), 1, false).unwrap();
        let b = interner.intern(TokenValue::Str("x".into()), 2, false).unwrap();
        assert_eq!(a, b);
        assert_eq!(*interner.payload(a), 1);
    }
}
