//! Per-call robots.txt cache and evaluator.
//!
//! A `RobotsCache` is constructed fresh for each `fetch` call, not kept
//! across calls, so a multi-URL batch sees one consistent decision per
//! host even if the remote file changes mid-batch.

use std::collections::HashMap;

use reqwest::Client;

#[derive(Debug, Clone)]
enum Policy {
    AllowAll,
    DenyAll,
    Rules(Vec<Rule>),
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

pub struct RobotsCache<'a> {
    client: &'a Client,
    user_agent: &'a str,
    cache: HashMap<String, Policy>,
}

impl<'a> RobotsCache<'a> {
    pub fn new(client: &'a Client, user_agent: &'a str) -> Self {
        Self {
            client,
            user_agent,
            cache: HashMap::new(),
        }
    }

    /// Whether `url` may be fetched under the origin's robots.txt,
    /// fetching and parsing that file on first use per origin.
    pub async fn is_allowed(&mut self, url: &url::Url) -> bool {
        let origin = origin_of(url);
        if !self.cache.contains_key(&origin) {
            let policy = self.fetch_policy(&origin).await;
            self.cache.insert(origin.clone(), policy);
        }
        match self.cache.get(&origin).unwrap() {
            Policy::AllowAll => true,
            Policy::DenyAll => false,
            Policy::Rules(rules) => evaluate(rules, url.path()),
        }
    }

    async fn fetch_policy(&self, origin: &str) -> Policy {
        let robots_url = format!("{origin}/robots.txt");
        match self.client.get(&robots_url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => Policy::AllowAll,
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => Policy::Rules(parse_rules(&body, self.user_agent)),
                Err(_) => Policy::DenyAll,
            },
            _ => Policy::DenyAll,
        }
    }
}

fn origin_of(url: &url::Url) -> String {
    match url.port() {
        Some(port) => format!("{}://{}:{port}", url.scheme(), url.host_str().unwrap_or_default()),
        None => format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default()),
    }
}

/// Parses the `Disallow`/`Allow` directives of the first matching
/// `User-agent` group (an exact match for `user_agent`, falling back to
/// `*`), ignoring every other group.
fn parse_rules(body: &str, user_agent: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut in_matching_group = false;
    let mut group_has_directives = false;

    for raw_line in body.lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                if group_has_directives {
                    in_matching_group = false;
                    group_has_directives = false;
                }
                if value == "*" || value.eq_ignore_ascii_case(user_agent) {
                    in_matching_group = true;
                }
            }
            "disallow" if in_matching_group => {
                group_has_directives = true;
                if value.is_empty() {
                    // An empty Disallow is an explicit allow-all per
                    // the de-facto robots.txt convention.
                    rules.push(Rule { allow: true, pattern: String::new() });
                } else {
                    rules.push(Rule { allow: false, pattern: value.to_string() });
                }
            }
            "allow" if in_matching_group && !value.is_empty() => {
                group_has_directives = true;
                rules.push(Rule { allow: true, pattern: value.to_string() });
            }
            _ => {}
        }
    }
    rules
}

/// Longest matching prefix wins, ties broken toward allow; no match
/// means allowed.
fn evaluate(rules: &[Rule], path: &str) -> bool {
    let mut best: Option<&Rule> = None;
    for rule in rules {
        if path.starts_with(rule.pattern.as_str()) {
            let better = match best {
                Some(b) if rule.pattern.len() == b.pattern.len() => rule.allow && !b.allow,
                Some(b) => rule.pattern.len() > b.pattern.len(),
                None => true,
            };
            if better {
                best = Some(rule);
            }
        }
    }
    best.map(|r| r.allow).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disallow_blocks_matching_prefix() {
        let rules = parse_rules("User-agent: *\nDisallow: /blocked\n", "cowork-fetch/0.1");
        assert!(!evaluate(&rules, "/blocked/page"));
        assert!(evaluate(&rules, "/allowed"));
    }

    #[test]
    fn allow_overrides_longer_disallow_prefix_match() {
        let rules = parse_rules(
            "User-agent: *\nDisallow: /a\nAllow: /a/public\n",
            "cowork-fetch/0.1",
        );
        assert!(evaluate(&rules, "/a/public/page"));
        assert!(!evaluate(&rules, "/a/private"));
    }

    #[test]
    fn unrelated_user_agent_group_is_ignored() {
        let rules = parse_rules(
            "User-agent: OtherBot\nDisallow: /everything\nUser-agent: *\nDisallow: /blocked\n",
            "cowork-fetch/0.1",
        );
        assert!(evaluate(&rules, "/everything"));
        assert!(!evaluate(&rules, "/blocked"));
    }
}
