//! Run-scoped cross-reference cache.
//!
//! Every key is bound at most once per run. A second binding is refused and
//! logged; the first value stays visible to later stages.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use shop_seed_core::rules::ProductRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeRef {
    pub id: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRef {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Default)]
pub struct CrossReferenceCache {
    users: Mutex<BTreeMap<String, UserRef>>,
    challenges: Mutex<BTreeMap<String, ChallengeRef>>,
    security_questions: Mutex<BTreeMap<u32, i64>>,
    products: Mutex<BTreeMap<usize, ProductRef>>,
    product_roles: Mutex<BTreeMap<ProductRole, usize>>,
    addresses: Mutex<BTreeMap<String, Vec<i64>>>,
    baskets: Mutex<BTreeMap<String, i64>>,
    blueprint_file: Mutex<Option<String>>,
}

impl CrossReferenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_user(&self, alias: &str, user: UserRef) -> bool {
        bind(&self.users, "user", alias.to_string(), user)
    }

    #[must_use]
    pub fn user(&self, alias: &str) -> Option<UserRef> {
        lookup(&self.users, &alias.to_string())
    }

    pub fn bind_challenge(&self, key: &str, challenge: ChallengeRef) -> bool {
        bind(&self.challenges, "challenge", key.to_string(), challenge)
    }

    #[must_use]
    pub fn challenge(&self, key: &str) -> Option<ChallengeRef> {
        lookup(&self.challenges, &key.to_string())
    }

    /// Bind the 1-based dataset position of a security question to its id.
    pub fn bind_security_question(&self, ordinal: u32, id: i64) -> bool {
        bind(&self.security_questions, "security_question", ordinal, id)
    }

    #[must_use]
    pub fn security_question(&self, ordinal: u32) -> Option<i64> {
        lookup(&self.security_questions, &ordinal)
    }

    pub fn bind_product(&self, slot: usize, product: ProductRef) -> bool {
        bind(&self.products, "product", slot, product)
    }

    #[must_use]
    pub fn product(&self, slot: usize) -> Option<ProductRef> {
        lookup(&self.products, &slot)
    }

    pub fn bind_product_role(&self, role: ProductRole, slot: usize) -> bool {
        bind(&self.product_roles, "product_role", role, slot)
    }

    #[must_use]
    pub fn product_for_role(&self, role: ProductRole) -> Option<ProductRef> {
        lookup(&self.product_roles, &role).and_then(|slot| self.product(slot))
    }

    /// Addresses accumulate per user; each id is recorded once.
    pub fn add_address(&self, alias: &str, address_id: i64) {
        let mut addresses = self.addresses.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = addresses.entry(alias.to_string()).or_default();
        if !entry.contains(&address_id) {
            entry.push(address_id);
        }
    }

    /// Lowest address id recorded for a user.
    #[must_use]
    pub fn first_address(&self, alias: &str) -> Option<i64> {
        let addresses = self.addresses.lock().unwrap_or_else(PoisonError::into_inner);
        addresses.get(alias).and_then(|ids| ids.iter().min().copied())
    }

    pub fn bind_basket(&self, alias: &str, basket_id: i64) -> bool {
        bind(&self.baskets, "basket", alias.to_string(), basket_id)
    }

    #[must_use]
    pub fn basket(&self, alias: &str) -> Option<i64> {
        lookup(&self.baskets, &alias.to_string())
    }

    pub fn bind_blueprint_file(&self, file: String) -> bool {
        let mut slot = self.blueprint_file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slot.as_ref() {
            tracing::warn!(
                namespace = "blueprint_file",
                existing = %existing,
                rejected = %file,
                "cross-reference already bound; keeping first value"
            );
            return false;
        }
        *slot = Some(file);
        true
    }

    #[must_use]
    pub fn blueprint_file(&self) -> Option<String> {
        self.blueprint_file.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn bind<K, V>(map: &Mutex<BTreeMap<K, V>>, namespace: &str, key: K, value: V) -> bool
where
    K: Ord + Debug,
{
    let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&key) {
        tracing::warn!(namespace, key = ?key, "cross-reference already bound; keeping first value");
        return false;
    }
    map.insert(key, value);
    true
}

fn lookup<K: Ord, V: Clone>(map: &Mutex<BTreeMap<K, V>>, key: &K) -> Option<V> {
    map.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_binding_wins() {
        let cache = CrossReferenceCache::new();
        assert!(cache.bind_user("admin", UserRef { id: 1, email: "admin@juice-sh.op".to_string() }));
        assert!(!cache.bind_user("admin", UserRef { id: 7, email: "other@juice-sh.op".to_string() }));
        assert_eq!(cache.user("admin").map(|user| user.id), Some(1));
        assert_eq!(cache.user("jim"), None);
    }

    #[test]
    fn product_roles_resolve_through_slots() {
        let cache = CrossReferenceCache::new();
        cache.bind_product(3, ProductRef { id: 4, name: "O-Saft".to_string(), price: 0.01 });
        cache.bind_product_role(ProductRole::TamperableUrl, 3);
        assert_eq!(cache.product_for_role(ProductRole::TamperableUrl).map(|p| p.id), Some(4));
        assert_eq!(cache.product_for_role(ProductRole::SeasonalSpecial), None);
    }

    #[test]
    fn first_address_is_the_lowest_id() {
        let cache = CrossReferenceCache::new();
        cache.add_address("bender", 6);
        cache.add_address("bender", 5);
        cache.add_address("bender", 6);
        assert_eq!(cache.first_address("bender"), Some(5));
        assert_eq!(cache.first_address("amy"), None);
    }

    #[test]
    fn blueprint_file_is_bound_once() {
        let cache = CrossReferenceCache::new();
        assert!(cache.bind_blueprint_file("JuiceShop.stl".to_string()));
        assert!(!cache.bind_blueprint_file("Other.stl".to_string()));
        assert_eq!(cache.blueprint_file().as_deref(), Some("JuiceShop.stl"));
    }
}
