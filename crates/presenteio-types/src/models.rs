use serde::{Deserialize, Serialize};

/// Account roles. Resolved once per request from the JWT claims;
/// handlers never consult related records to decide authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Organizer,
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Organizer => "organizer",
            Role::Moderator => "moderator",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "guest" => Some(Role::Guest),
            "organizer" => Some(Role::Organizer),
            "moderator" => Some(Role::Moderator),
            _ => None,
        }
    }
}

/// Delivery channel for one-time codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpChannel {
    Sms,
    Email,
}

impl OtpChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpChannel::Sms => "sms",
            OtpChannel::Email => "email",
        }
    }

    pub fn parse(s: &str) -> Option<OtpChannel> {
        match s {
            "sms" => Some(OtpChannel::Sms),
            "email" => Some(OtpChannel::Email),
            _ => None,
        }
    }
}

/// A labeled store link attached to a gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLink {
    pub label: String,
    pub url: String,
}

/// Parse the raw purchase-links text an organizer enters on a gift.
///
/// One link per line, either `label | url` or a bare URL. Blank lines are
/// skipped, a missing scheme defaults to https, and a missing label falls
/// back to the URL itself.
pub fn parse_purchase_links(raw: &str) -> Vec<PurchaseLink> {
    let mut items = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (label, url) = match line.split_once('|') {
            Some((label, url)) => (label.trim().to_string(), url.trim().to_string()),
            None => (String::new(), line.to_string()),
        };
        if url.is_empty() {
            continue;
        }

        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url
        } else {
            format!("https://{url}")
        };
        let label = if label.is_empty() { url.clone() } else { label };

        items.push(PurchaseLink { label, url });
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Guest, Role::Organizer, Role::Moderator] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn parses_labeled_and_bare_links() {
        let raw = "Amazon | https://amazon.com.br/item\n\nmagalu.com.br/item\n";
        let links = parse_purchase_links(raw);
        assert_eq!(
            links,
            vec![
                PurchaseLink {
                    label: "Amazon".into(),
                    url: "https://amazon.com.br/item".into(),
                },
                PurchaseLink {
                    label: "https://magalu.com.br/item".into(),
                    url: "https://magalu.com.br/item".into(),
                },
            ]
        );
    }

    #[test]
    fn skips_lines_without_a_url() {
        assert!(parse_purchase_links("Loja | \n   \n").is_empty());
    }

    #[test]
    fn keeps_existing_scheme() {
        let links = parse_purchase_links("http://example.com");
        assert_eq!(links[0].url, "http://example.com");
    }
}
