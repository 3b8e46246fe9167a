//! Context handed to the external assistant, and handling of what comes back.
//! Replies are display text only; nothing here can reach the vault.

use crate::market::Market;
use crate::wallet::Wallet;

pub const MAX_REPLY_CHARS: usize = 4000;
pub const FALLBACK_REPLY: &str = "I couldn't retrieve that information.";

/// `Holdings: .. Balance: $.. Market: .. Query: ..` built from live values.
pub fn build_context(wallet: &Wallet, market: &Market, query: &str) -> String {
    let holdings = wallet
        .assets
        .iter()
        .map(|(symbol, qty)| format!("{qty} {symbol}"))
        .collect::<Vec<_>>()
        .join(", ");
    let prices = market
        .assets()
        .iter()
        .map(|a| format!("{}: ${}", a.symbol, a.price))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Holdings: {holdings}. Balance: ${}.\nMarket: {prices}.\nQuery: {}",
        wallet.cash_balance,
        query.trim()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingLink {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReply {
    pub text: String,
    pub links: Vec<GroundingLink>,
}

/// Cleans an untrusted reply for display. Control characters other than
/// newline and tab are dropped, text is capped at [`MAX_REPLY_CHARS`], and
/// only http(s) links survive.
pub fn sanitize_reply(text: Option<&str>, links: Vec<GroundingLink>) -> OracleReply {
    let cleaned: String = text
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_REPLY_CHARS)
        .collect();
    let text = if cleaned.trim().is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        cleaned
    };
    let links = links
        .into_iter()
        .filter(|link| {
            let uri = link.uri.trim().to_ascii_lowercase();
            uri.starts_with("https://") || uri.starts_with("http://")
        })
        .map(|link| GroundingLink {
            title: link.title.chars().filter(|c| !c.is_control()).collect(),
            uri: link.uri.trim().to_string(),
        })
        .collect();
    OracleReply { text, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_lists_holdings_cash_and_prices() {
        let mut wallet = Wallet::with_cash(350.0);
        wallet.credit_asset("BTC", 0.01);
        let context = build_context(&wallet, &Market::default(), "  should I sell?  ");
        assert!(context.starts_with("Holdings: 0.01 BTC. Balance: $350."));
        assert!(context.contains("BTC: $64230.5, ETH: $3450.2"));
        assert!(context.ends_with("Query: should I sell?"));
    }

    #[test]
    fn reply_is_stripped_and_capped() {
        let noisy = format!("ok\u{1b}[31m\u{7}{}", "x".repeat(MAX_REPLY_CHARS * 2));
        let reply = sanitize_reply(Some(&noisy), Vec::new());
        assert!(reply.text.starts_with("ok[31m"));
        assert_eq!(reply.text.chars().count(), MAX_REPLY_CHARS);
    }

    #[test]
    fn empty_reply_falls_back() {
        assert_eq!(sanitize_reply(None, Vec::new()).text, FALLBACK_REPLY);
        assert_eq!(sanitize_reply(Some(" \u{0} "), Vec::new()).text, FALLBACK_REPLY);
    }

    #[test]
    fn only_web_links_survive() {
        let links = vec![
            GroundingLink {
                title: "docs".to_string(),
                uri: "https://example.org/a".to_string(),
            },
            GroundingLink {
                title: "bad".to_string(),
                uri: "javascript:alert(1)".to_string(),
            },
        ];
        let reply = sanitize_reply(Some("hi"), links);
        assert_eq!(reply.links.len(), 1);
        assert_eq!(reply.links[0].title, "docs");
    }
}
