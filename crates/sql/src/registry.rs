use std::collections::BTreeMap;
use std::sync::Arc;

use dbcheck_core::EvalError;

use crate::dialect::{Dialect, MySql, Postgres, Sqlite};

/// Dialects keyed by the lower-cased product name a connection reports.
#[derive(Clone)]
pub struct DialectRegistry {
    dialects: BTreeMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// A registry with no dialects.
    pub fn empty() -> Self {
        DialectRegistry {
            dialects: BTreeMap::new(),
        }
    }

    /// MySQL (also answering to MariaDB), SQLite and PostgreSQL.
    pub fn with_defaults() -> Self {
        let mut registry = DialectRegistry::empty();
        registry.register(Arc::new(MySql));
        registry.register_alias("mariadb", Arc::new(MySql));
        registry.register(Arc::new(Sqlite));
        registry.register(Arc::new(Postgres));
        registry
    }

    /// Register `dialect` under its own name, replacing any previous entry.
    pub fn register(&mut self, dialect: Arc<dyn Dialect>) {
        self.dialects.insert(dialect.name().to_string(), dialect);
    }

    pub fn register_alias(&mut self, product: &str, dialect: Arc<dyn Dialect>) {
        self.dialects.insert(product.to_lowercase(), dialect);
    }

    /// Look up the dialect for a connection's product name.
    pub fn resolve(&self, product: &str) -> Result<Arc<dyn Dialect>, EvalError> {
        let key = product.trim().to_lowercase();
        self.dialects.get(&key).cloned().ok_or_else(|| {
            EvalError::configuration(format!(
                "no SQL dialect registered for database product '{}'",
                product
            ))
        })
    }

    /// Registered product keys, in sorted order.
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        DialectRegistry::with_defaults()
    }
}

impl std::fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.dialects.keys()).finish()
    }
}
