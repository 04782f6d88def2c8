// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge construction.
//!
//! A challenge is never stored. It is rebuilt on demand from the template text
//! and the identity's current nonce, so the bytes produced for the client at
//! `introduce` time and the bytes checked at `prove` time come from the same
//! code path.
//!
//! ## Encodings
//!
//! - `evm`: EIP-712 typed data, primary type `Challenge { string message; string nonce; }`.
//!   The challenge bytes are `0x19 0x01 ‖ domainSeparator ‖ hashStruct(challenge)`;
//!   keccak256 of those bytes is the digest the wallet signs.
//! - `cardano`: UTF-8 `template ‖ nonce`, carried as the COSE_Sign1 payload.

use std::collections::BTreeMap;
use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use super::address::Scheme;
use super::error::AuthError;

mod typed {
    use alloy::sol;

    sol! {
        struct Challenge {
            string message;
            string nonce;
        }
    }
}

/// Primary type name clients must use when signing.
pub const PRIMARY_TYPE: &str = "Challenge";

/// Text embedded in every challenge when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "Sign this message to prove you own this wallet and log in. \
This request will not trigger a blockchain transaction or cost any fees.";

/// Source of the human-readable challenge text.
#[derive(Debug, Clone)]
pub enum ChallengeTemplate {
    /// Fixed text held in memory.
    Static(String),
    /// Text read from disk on every use, so edits apply without a restart.
    File(PathBuf),
}

impl Default for ChallengeTemplate {
    fn default() -> Self {
        ChallengeTemplate::Static(DEFAULT_TEMPLATE.to_string())
    }
}

impl ChallengeTemplate {
    /// Load the template text.
    ///
    /// Fails with `ChallengeUnavailable` if the file cannot be read or is empty.
    /// The failure is local to the current request.
    pub fn load(&self) -> Result<String, AuthError> {
        let text = match self {
            ChallengeTemplate::Static(text) => text.clone(),
            ChallengeTemplate::File(path) => std::fs::read_to_string(path)
                .map_err(|e| {
                    AuthError::ChallengeUnavailable(format!("{}: {e}", path.display()))
                })?
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        };

        if text.is_empty() {
            return Err(AuthError::ChallengeUnavailable(
                "challenge template is empty".to_string(),
            ));
        }

        Ok(text)
    }
}

/// EIP-712 domain fields. All optional; the default is the empty domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDescriptor {
    pub name: Option<String>,
    pub version: Option<String>,
    pub chain_id: Option<u64>,
    pub verifying_contract: Option<Address>,
}

impl DomainDescriptor {
    fn to_eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            self.name.clone().map(Into::into),
            self.version.clone().map(Into::into),
            self.chain_id.map(U256::from),
            self.verifying_contract,
            None,
        )
    }

    /// JSON domain object and the matching `EIP712Domain` type fields, in
    /// canonical field order.
    fn to_view(&self) -> (Map<String, Value>, Vec<TypedField>) {
        let mut domain = Map::new();
        let mut fields = Vec::new();

        if let Some(name) = &self.name {
            domain.insert("name".to_string(), json!(name));
            fields.push(TypedField::new("name", "string"));
        }
        if let Some(version) = &self.version {
            domain.insert("version".to_string(), json!(version));
            fields.push(TypedField::new("version", "string"));
        }
        if let Some(chain_id) = self.chain_id {
            domain.insert("chainId".to_string(), json!(chain_id));
            fields.push(TypedField::new("chainId", "uint256"));
        }
        if let Some(contract) = &self.verifying_contract {
            domain.insert("verifyingContract".to_string(), json!(contract.to_checksum(None)));
            fields.push(TypedField::new("verifyingContract", "address"));
        }

        (domain, fields)
    }
}

/// One `{ name, type }` entry of an EIP-712 type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedField {
    fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// The message part of the typed-data challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChallengeMessage {
    pub message: String,
    pub nonce: String,
}

/// EIP-712 typed data, ready to pass to `eth_signTypedData_v4`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataView {
    pub types: BTreeMap<String, Vec<TypedField>>,
    #[schema(value_type = Object)]
    pub domain: Map<String, Value>,
    pub primary_type: String,
    pub message: ChallengeMessage,
}

/// Challenge for envelope signing; the wallet signs `message ‖ nonce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnvelopeView {
    pub message: String,
    pub nonce: String,
    /// `message` immediately followed by `nonce`.
    pub payload: String,
}

/// Client-facing view of a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ChallengeView {
    TypedData(TypedDataView),
    Envelope(EnvelopeView),
}

/// An ephemeral challenge: template text plus the identity's current nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub template: String,
    pub nonce: String,
}

/// Builds challenges and their per-scheme byte encodings.
#[derive(Debug, Clone, Default)]
pub struct ChallengeBuilder {
    template: ChallengeTemplate,
    domain: DomainDescriptor,
}

impl ChallengeBuilder {
    pub fn new(template: ChallengeTemplate, domain: DomainDescriptor) -> Self {
        Self { template, domain }
    }

    /// Read the template text. Call before mutating any state.
    pub fn template_text(&self) -> Result<String, AuthError> {
        self.template.load()
    }

    pub fn build(&self, template: String, nonce: &str) -> Challenge {
        Challenge {
            template,
            nonce: nonce.to_string(),
        }
    }

    /// The exact bytes the verifier checks for `scheme`.
    pub fn signing_bytes(&self, challenge: &Challenge, scheme: Scheme) -> Vec<u8> {
        match scheme {
            Scheme::Evm => {
                let typed = typed::Challenge {
                    message: challenge.template.clone(),
                    nonce: challenge.nonce.clone(),
                };
                let mut bytes = Vec::with_capacity(66);
                bytes.extend_from_slice(&[0x19, 0x01]);
                bytes.extend_from_slice(self.domain.to_eip712().separator().as_slice());
                bytes.extend_from_slice(typed.eip712_hash_struct().as_slice());
                bytes
            }
            Scheme::Cardano => {
                let mut bytes =
                    Vec::with_capacity(challenge.template.len() + challenge.nonce.len());
                bytes.extend_from_slice(challenge.template.as_bytes());
                bytes.extend_from_slice(challenge.nonce.as_bytes());
                bytes
            }
        }
    }

    /// The structure handed to the client for signing.
    pub fn view(&self, challenge: &Challenge, scheme: Scheme) -> ChallengeView {
        match scheme {
            Scheme::Evm => {
                let (domain, domain_fields) = self.domain.to_view();
                let mut types = BTreeMap::new();
                types.insert("EIP712Domain".to_string(), domain_fields);
                types.insert(
                    PRIMARY_TYPE.to_string(),
                    vec![
                        TypedField::new("message", "string"),
                        TypedField::new("nonce", "string"),
                    ],
                );
                ChallengeView::TypedData(TypedDataView {
                    types,
                    domain,
                    primary_type: PRIMARY_TYPE.to_string(),
                    message: ChallengeMessage {
                        message: challenge.template.clone(),
                        nonce: challenge.nonce.clone(),
                    },
                })
            }
            Scheme::Cardano => ChallengeView::Envelope(EnvelopeView {
                message: challenge.template.clone(),
                nonce: challenge.nonce.clone(),
                payload: format!("{}{}", challenge.template, challenge.nonce),
            }),
        }
    }
}
