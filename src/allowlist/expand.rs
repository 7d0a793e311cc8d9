//! Expansion of the compiled allowlist back into client specs.

use crate::allowlist::types::{ClientPatternSpec, CompiledAllowlist};
use crate::allowlist::hosts::to_long_url;

/// Rebuild one absolute spec per client name.
///
/// Entries sharing a client name across hosts are merged in host order; the
/// first entry seen for a client decides its `loginUrl`.
pub fn expand(allowlist: &CompiledAllowlist) -> Vec<ClientPatternSpec> {
    let mut clients: Vec<ClientPatternSpec> = Vec::new();

    for (domain, entries) in allowlist.iter() {
        for entry in entries {
            let i = match clients.iter().position(|c| c.client_name == entry.client_name) {
                Some(i) => i,
                None => {
                    clients.push(ClientPatternSpec {
                        client_name: entry.client_name.clone(),
                        login_url: entry.login_url.as_deref().map(|u| to_long_url(domain, u)),
                        patterns: Vec::new(),
                    });
                    clients.len() - 1
                }
            };

            clients[i]
                .patterns
                .extend(entry.patterns.iter().map(|p| to_long_url(domain, p)));
        }
    }

    clients
}
