//! # Domain Value Objects
//!
//! Identifiers and query shapes exchanged with the chain gateway.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::AddressError;

/// Network prefix used by mainnet addresses.
pub const MAINNET_PREFIX: char = 'f';

/// Network prefix used by testnet addresses.
pub const TESTNET_PREFIX: char = 't';

/// Highest address protocol indicator currently defined (0 = ID, 4 = delegated).
pub const MAX_PROTOCOL: u8 = 4;

/// Participant address (storage miner actor address).
///
/// Kept in its textual form: `<network><protocol><payload>`, e.g. `t01000`.
/// The payload is treated as opaque; only the prefix is validated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address string.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let mut chars = s.chars();

        let network = chars.next().ok_or(AddressError::Empty)?;
        if network != MAINNET_PREFIX && network != TESTNET_PREFIX {
            return Err(AddressError::UnknownNetwork(network));
        }

        let protocol = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| AddressError::InvalidProtocol(s.to_string()))?;
        if protocol > u32::from(MAX_PROTOCOL) {
            return Err(AddressError::InvalidProtocol(s.to_string()));
        }

        let payload = chars.as_str();
        if payload.is_empty() {
            return Err(AddressError::MissingPayload(s.to_string()));
        }
        if !payload.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AddressError::InvalidPayload(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// Build a testnet ID address (`t0<id>`).
    pub fn from_actor_id(id: u64) -> Self {
        Self(format!("{TESTNET_PREFIX}0{id}"))
    }

    /// Network prefix character.
    pub fn network(&self) -> char {
        self.0.chars().next().unwrap_or(TESTNET_PREFIX)
    }

    /// Address protocol indicator.
    pub fn protocol(&self) -> u8 {
        self.0
            .chars()
            .nth(1)
            .and_then(|c| c.to_digit(10))
            .map(|d| d as u8)
            .unwrap_or_default()
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// libp2p peer identity of a participant, kept as its base58 string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap a peer identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Actor method number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodNum(pub u64);

impl fmt::Display for MethodNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tipset selector for directory lookups.
///
/// `None` at call sites means "current chain head".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSetKey(pub Vec<String>);

impl TipSetKey {
    /// Block CIDs making up the tipset.
    pub fn cids(&self) -> &[String] {
        &self.0
    }
}

/// Read-only state call against an actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateQuery {
    /// Actor receiving the call.
    pub to: Address,
    /// Caller address.
    pub from: Address,
    /// Method to invoke.
    pub method: MethodNum,
}

impl StateQuery {
    /// Call `method` on `participant`, from the participant itself.
    pub fn self_call(participant: &Address, method: MethodNum) -> Self {
        Self {
            to: participant.clone(),
            from: participant.clone(),
            method,
        }
    }
}

/// Raw result of a state call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateCallResult {
    /// Application exit code; zero is success.
    pub exit_code: i64,
    /// Raw return bytes (CBOR).
    pub return_data: Vec<u8>,
}

impl StateCallResult {
    /// Successful call returning `data`.
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            exit_code: 0,
            return_data: data,
        }
    }

    /// Call rejected by the actor with `exit_code`.
    pub fn rejected(exit_code: i64) -> Self {
        Self {
            exit_code,
            return_data: Vec::new(),
        }
    }

    /// Whether the actor reported success.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_address() {
        let addr = Address::parse("t01000").unwrap();
        assert_eq!(addr.network(), 't');
        assert_eq!(addr.protocol(), 0);
        assert_eq!(addr.to_string(), "t01000");
    }

    const MAINNET_BLS: &str =
        "f3vvmn62lofvhjd2ugzca6sof2j2ubwok6cj4xxbfzz4yuxfkgobpihhd2thlanmsh3w2ptld2gqkn2jvlss4a";

    #[test]
    fn test_parse_mainnet_bls_address() {
        let addr: Address = MAINNET_BLS.parse().unwrap();
        assert_eq!(addr.network(), 'f');
        assert_eq!(addr.protocol(), 3);
    }

    #[test]
    fn test_parse_rejects_unknown_network() {
        assert_eq!(
            Address::parse("x01000"),
            Err(AddressError::UnknownNetwork('x'))
        );
    }

    #[test]
    fn test_parse_rejects_bad_protocol() {
        assert!(matches!(
            Address::parse("t91000"),
            Err(AddressError::InvalidProtocol(_))
        ));
        assert!(matches!(
            Address::parse("tx1000"),
            Err(AddressError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_and_missing_payload() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert!(matches!(
            Address::parse("t0"),
            Err(AddressError::MissingPayload(_))
        ));
    }

    #[test]
    fn test_from_actor_id() {
        assert_eq!(Address::from_actor_id(1234).as_str(), "t01234");
    }

    #[test]
    fn test_address_serde_validates() {
        let ok: Result<Address, _> = serde_json::from_str("\"t01000\"");
        assert!(ok.is_ok());
        let bad: Result<Address, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_self_call_targets_participant() {
        let addr = Address::from_actor_id(7);
        let query = StateQuery::self_call(&addr, MethodNum(15));
        assert_eq!(query.to, addr);
        assert_eq!(query.from, addr);
        assert_eq!(query.method, MethodNum(15));
    }

    #[test]
    fn test_state_call_result_success() {
        assert!(StateCallResult::ok(vec![0xf5]).is_success());
        assert!(!StateCallResult::rejected(16).is_success());
    }
}
