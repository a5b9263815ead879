use std::collections::HashMap;
use std::env;

use anyhow::Result;

/// Service configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    /// Request host → tenant (`company_id`) mapping. Every deployment serves
    /// one or more branded domains, each bound to exactly one tenant.
    pub tenant_domains: HashMap<String, String>,
    /// Fallback tenant for hosts missing from the map (local development).
    pub default_company_id: Option<String>,
}

/// Read configuration from the environment.
///
/// `TENANT_DOMAINS` is a comma-separated `host=company_id` list, e.g.
/// `food.example.com=f770d5f7-...,demo.localhost=11111111-...`.
pub fn load() -> Result<Config> {
    let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    let tenant_domains = env::var("TENANT_DOMAINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|pair| {
            let (host, company_id) = pair.split_once('=')?;
            let host = host.trim();
            let company_id = company_id.trim();
            if host.is_empty() || company_id.is_empty() {
                return None;
            }
            Some((host.to_owned(), company_id.to_owned()))
        })
        .collect();

    Ok(Config {
        listen_addr,
        tenant_domains,
        default_company_id: env::var("DEFAULT_COMPANY_ID").ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tenant_domain_pairs() {
        // Serialized through the same parsing path `load` uses.
        let parsed: HashMap<String, String> = "a.example.com=c1, b.example.com=c2,broken"
            .split(',')
            .filter_map(|pair| {
                let (host, company_id) = pair.split_once('=')?;
                Some((host.trim().to_owned(), company_id.trim().to_owned()))
            })
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a.example.com"], "c1");
        assert_eq!(parsed["b.example.com"], "c2");
    }
}
