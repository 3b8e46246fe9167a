use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::rng::{RandomSource, pick_index};

pub const CASH: &str = "USD";

/// Debits within this distance of the balance are treated as exact.
pub(crate) const BALANCE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftTrait {
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nft {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub traits: Vec<NftTrait>,
}

/// Cash, per-asset quantities and collectibles for one session. Balances never
/// go negative through these methods; a debit that does not fit is refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub cash_balance: f64,
    pub assets: BTreeMap<String, f64>,
    pub nfts: Vec<Nft>,
    pub address: Option<String>,
}

impl Wallet {
    pub fn with_cash(cash_balance: f64) -> Self {
        Self {
            cash_balance,
            assets: BTreeMap::new(),
            nfts: Vec::new(),
            address: None,
        }
    }

    /// The starter vault a fresh session opens with.
    pub fn genesis() -> Self {
        let mut wallet = Self::with_cash(1_991_090.0);
        wallet.assets.insert("BTC".to_string(), 0.1);
        wallet.assets.insert("ETH".to_string(), 1.5);
        wallet.nfts = vec![
            Nft {
                id: "n1".to_string(),
                name: "Ape Node Alpha".to_string(),
                description: "Rare computational primate from the genesis block.".to_string(),
                image_url: "https://api.dicebear.com/7.x/bottts/svg?seed=ApeAlpha&backgroundColor=ffb300".to_string(),
                traits: vec![
                    NftTrait {
                        kind: "Rarity".to_string(),
                        value: "Legendary".to_string(),
                    },
                    NftTrait {
                        kind: "Compute Power".to_string(),
                        value: "Over 9000".to_string(),
                    },
                ],
            },
            Nft {
                id: "n2".to_string(),
                name: "Cyber Crystal".to_string(),
                description: "Pure energy shard harvested from the Nexus mine.".to_string(),
                image_url: "https://api.dicebear.com/7.x/bottts/svg?seed=Crystal&backgroundColor=00d4ff".to_string(),
                traits: vec![NftTrait {
                    kind: "Core".to_string(),
                    value: "Quantum".to_string(),
                }],
            },
            Nft {
                id: "n3".to_string(),
                name: "Neon Samur.ai".to_string(),
                description: "Elite protector of the deep vault private keys.".to_string(),
                image_url: "https://api.dicebear.com/7.x/bottts/svg?seed=Samurai&backgroundColor=ff0055".to_string(),
                traits: vec![NftTrait {
                    kind: "Armor".to_string(),
                    value: "Carbon Fiber".to_string(),
                }],
            },
        ];
        wallet
    }

    pub fn quantity(&self, symbol: &str) -> f64 {
        self.assets.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn check_cash(&self, amount: f64) -> CoreResult<()> {
        if self.cash_balance + BALANCE_EPSILON < amount {
            return Err(CoreError::insufficient(CASH, amount, self.cash_balance));
        }
        Ok(())
    }

    pub fn check_asset(&self, symbol: &str, amount: f64) -> CoreResult<()> {
        let held = self.quantity(symbol);
        if held + BALANCE_EPSILON < amount {
            return Err(CoreError::insufficient(symbol, amount, held));
        }
        Ok(())
    }

    pub fn debit_cash(&mut self, amount: f64) -> CoreResult<()> {
        self.check_cash(amount)?;
        self.cash_balance = (self.cash_balance - amount).max(0.0);
        Ok(())
    }

    pub fn credit_cash(&mut self, amount: f64) {
        self.cash_balance += amount;
    }

    pub fn debit_asset(&mut self, symbol: &str, amount: f64) -> CoreResult<()> {
        self.check_asset(symbol, amount)?;
        let entry = self.assets.entry(symbol.to_string()).or_insert(0.0);
        *entry = (*entry - amount).max(0.0);
        Ok(())
    }

    pub fn credit_asset(&mut self, symbol: &str, amount: f64) {
        *self.assets.entry(symbol.to_string()).or_insert(0.0) += amount;
    }

    pub fn connect(&mut self, address: impl Into<String>) {
        self.address = Some(address.into());
    }

    pub fn disconnect(&mut self) -> Option<String> {
        self.address.take()
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::genesis()
    }
}

/// Stand-in for the wallet-connect flow: `0x` plus forty hex digits.
pub fn mock_address<R: RandomSource + ?Sized>(rng: &mut R) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let body: String = (0..40)
        .map(|_| HEX[pick_index(rng, HEX.len())] as char)
        .collect();
    format!("0x{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_over_balance_is_refused_and_leaves_state() {
        let mut wallet = Wallet::with_cash(100.0);
        let err = wallet.debit_cash(100.5).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientBalance {
                asset: "USD".to_string(),
                needed: 100.5,
                available: 100.0,
            }
        );
        assert_eq!(wallet.cash_balance, 100.0);
    }

    #[test]
    fn exact_debit_empties_balance() {
        let mut wallet = Wallet::with_cash(0.3);
        wallet.debit_cash(0.1 + 0.2).unwrap();
        assert_eq!(wallet.cash_balance, 0.0);
    }

    #[test]
    fn assets_default_to_zero() {
        let mut wallet = Wallet::with_cash(0.0);
        assert_eq!(wallet.quantity("SOL"), 0.0);
        assert!(wallet.debit_asset("SOL", 1.0).is_err());
        wallet.credit_asset("SOL", 2.5);
        wallet.debit_asset("SOL", 1.0).unwrap();
        assert_eq!(wallet.quantity("SOL"), 1.5);
    }

    #[test]
    fn genesis_vault_contents() {
        let wallet = Wallet::genesis();
        assert_eq!(wallet.cash_balance, 1_991_090.0);
        assert_eq!(wallet.quantity("BTC"), 0.1);
        assert_eq!(wallet.nfts.len(), 3);
        assert!(wallet.address.is_none());
    }

    #[test]
    fn connect_and_disconnect_address() {
        let mut wallet = Wallet::with_cash(0.0);
        let mut rng = crate::rng::seeded("connect");
        let address = mock_address(&mut rng);
        assert_eq!(address.len(), 42);
        assert!(address.starts_with("0x"));
        wallet.connect(address.clone());
        assert_eq!(wallet.disconnect(), Some(address));
        assert!(wallet.address.is_none());
    }
}
