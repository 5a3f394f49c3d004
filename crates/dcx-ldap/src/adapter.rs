use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};

use dcx_core::ports::adapter::{
    AdapterError, DirectoryAdapter, DirectoryEntry, ModifyOp, ProtocolAdapter, SearchScope,
};

use crate::error::LdapAdapterError;

/// `ldap3`-backed directory adapter. `connect` opens the connection, drives
/// it on a background task, and performs the simple bind; every
/// `DirectoryAdapter` call clones the cheap `Ldap` handle out of
/// `handle` rather than holding a lock across an await.
pub struct Ldap3DirectoryAdapter {
    url: String,
    bind_dn: String,
    password: String,
    verify_ssl: bool,
    handle: tokio::sync::RwLock<Option<Ldap>>,
}

impl Ldap3DirectoryAdapter {
    #[must_use]
    pub fn new(host: &str, port: u16, ssl: bool, bind_dn: impl Into<String>, password: impl Into<String>, verify_ssl: bool) -> Self {
        let scheme = if ssl { "ldaps" } else { "ldap" };
        Self {
            url: format!("{scheme}://{host}:{port}"),
            bind_dn: bind_dn.into(),
            password: password.into(),
            verify_ssl,
            handle: tokio::sync::RwLock::new(None),
        }
    }

    async fn ldap(&self) -> Result<Ldap, AdapterError> {
        self.handle
            .read()
            .await
            .clone()
            .ok_or(AdapterError::NotConnected)
    }
}

#[async_trait]
impl ProtocolAdapter for Ldap3DirectoryAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        let settings = LdapConnSettings::new().set_no_tls_verify(!self.verify_ssl);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.url)
            .await
            .map_err(|e| LdapAdapterError::Connect(self.url.clone(), e.to_string()))?;
        ldap3::drive!(conn);

        ldap.simple_bind(&self.bind_dn, &self.password)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| LdapAdapterError::Bind(e.to_string()))?;

        *self.handle.write().await = Some(ldap);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        if let Some(mut ldap) = self.handle.write().await.take() {
            let _ = ldap.unbind().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.handle.try_read().map(|guard| guard.is_some()).unwrap_or(false)
    }
}

fn map_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

#[async_trait]
impl DirectoryAdapter for Ldap3DirectoryAdapter {
    async fn search(
        &self,
        base_dn: &str,
        filter: &str,
        attrs: Option<&[&str]>,
        scope: SearchScope,
    ) -> Result<Vec<DirectoryEntry>, AdapterError> {
        let mut ldap = self.ldap().await?;
        let attrs: Vec<&str> = attrs.map(<[&str]>::to_vec).unwrap_or_else(|| vec!["*"]);

        let (entries, _) = ldap
            .search(base_dn, map_scope(scope), filter, attrs)
            .await
            .and_then(ldap3::SearchResult::success)
            .map_err(|e| LdapAdapterError::Search(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|raw| {
                let entry = SearchEntry::construct(raw);
                let mut attributes: HashMap<String, Vec<Vec<u8>>> = entry
                    .attrs
                    .into_iter()
                    .map(|(name, values)| (name, values.into_iter().map(String::into_bytes).collect()))
                    .collect();
                for (name, values) in entry.bin_attrs {
                    attributes.entry(name).or_default().extend(values);
                }
                DirectoryEntry { dn: entry.dn, attributes }
            })
            .collect())
    }

    async fn add(&self, dn: &str, attrs: &HashMap<String, Vec<Vec<u8>>>) -> Result<(), AdapterError> {
        let mut ldap = self.ldap().await?;
        let entries: Vec<(Vec<u8>, HashSet<Vec<u8>>)> = attrs
            .iter()
            .map(|(name, values)| (name.clone().into_bytes(), values.iter().cloned().collect()))
            .collect();

        ldap.add(dn, entries)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| LdapAdapterError::Operation {
                operation: "add",
                dn: dn.to_string(),
                detail: e.to_string(),
            })?;
        Ok(())
    }

    async fn modify(&self, dn: &str, changes: &HashMap<String, (ModifyOp, Vec<Vec<u8>>)>) -> Result<(), AdapterError> {
        let mut ldap = self.ldap().await?;
        let mods: Vec<Mod<Vec<u8>>> = changes
            .iter()
            .map(|(attr, (op, values))| {
                let key = attr.clone().into_bytes();
                let set: HashSet<Vec<u8>> = values.iter().cloned().collect();
                match op {
                    ModifyOp::Add => Mod::Add(key, set),
                    ModifyOp::Delete => Mod::Delete(key, set),
                    ModifyOp::Replace => Mod::Replace(key, set),
                }
            })
            .collect();

        ldap.modify(dn, mods)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| LdapAdapterError::Operation {
                operation: "modify",
                dn: dn.to_string(),
                detail: e.to_string(),
            })?;
        Ok(())
    }

    async fn delete(&self, dn: &str) -> Result<(), AdapterError> {
        let mut ldap = self.ldap().await?;
        ldap.delete(dn)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| LdapAdapterError::Operation {
                operation: "delete",
                dn: dn.to_string(),
                detail: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_ldaps_scheme_when_ssl_requested() {
        let adapter = Ldap3DirectoryAdapter::new("dc.example.com", 636, true, "cn=admin,dc=example,dc=com", "secret", true);
        assert_eq!(adapter.url, "ldaps://dc.example.com:636");
    }

    #[test]
    fn url_uses_plain_ldap_scheme_without_ssl() {
        let adapter = Ldap3DirectoryAdapter::new("dc.example.com", 389, false, "cn=admin,dc=example,dc=com", "secret", true);
        assert_eq!(adapter.url, "ldap://dc.example.com:389");
    }

    #[tokio::test]
    async fn is_connected_is_false_before_connect() {
        let adapter = Ldap3DirectoryAdapter::new("dc.example.com", 389, false, "cn=admin,dc=example,dc=com", "secret", true);
        assert!(!adapter.is_connected());
    }
}
