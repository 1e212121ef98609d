//! ERC reference catalog
//!
//! Static description of the token standards the planner knows about, used to
//! avoid asking the user about functions a standard already provides.

use serde::Serialize;
use tracing::debug;

/// One ERC standard
#[derive(Debug, Clone, Serialize)]
pub struct ErcStandard {
    pub standard: &'static str,
    pub description: &'static str,
    pub standard_functions: &'static [&'static str],
    pub standard_events: &'static [&'static str],
    pub typical_extensions: &'static [&'static str],
}

pub const CATALOG: &[ErcStandard] = &[
    ErcStandard {
        standard: "ERC-20",
        description: "Fungible token standard. All tokens are identical and interchangeable.",
        standard_functions: &[
            "totalSupply() → uint256",
            "balanceOf(address account) → uint256",
            "transfer(address to, uint256 amount) → bool",
            "allowance(address owner, address spender) → uint256",
            "approve(address spender, uint256 amount) → bool",
            "transferFrom(address from, address to, uint256 amount) → bool",
        ],
        standard_events: &[
            "Transfer(address from, address to, uint256 value)",
            "Approval(address owner, address spender, uint256 value)",
        ],
        typical_extensions: &["Mintable", "Burnable", "Pausable", "Ownable", "Capped"],
    },
    ErcStandard {
        standard: "ERC-721",
        description: "Non-fungible token standard. Each token is unique.",
        standard_functions: &[
            "balanceOf(address owner) → uint256",
            "ownerOf(uint256 tokenId) → address",
            "safeTransferFrom(address from, address to, uint256 tokenId)",
            "transferFrom(address from, address to, uint256 tokenId)",
            "approve(address to, uint256 tokenId)",
            "getApproved(uint256 tokenId) → address",
            "setApprovalForAll(address operator, bool approved)",
            "isApprovedForAll(address owner, address operator) → bool",
        ],
        standard_events: &[
            "Transfer(address from, address to, uint256 tokenId)",
            "Approval(address owner, address approved, uint256 tokenId)",
            "ApprovalForAll(address owner, address operator, bool approved)",
        ],
        typical_extensions: &["Mintable", "Burnable", "URIStorage", "Royalties (EIP-2981)", "Enumerable"],
    },
    ErcStandard {
        standard: "ERC-1155",
        description: "Multi-token standard. Supports both fungible and non-fungible tokens in one contract.",
        standard_functions: &[
            "balanceOf(address account, uint256 id) → uint256",
            "balanceOfBatch(address[] accounts, uint256[] ids) → uint256[]",
            "setApprovalForAll(address operator, bool approved)",
            "isApprovedForAll(address account, address operator) → bool",
            "safeTransferFrom(address from, address to, uint256 id, uint256 amount, bytes data)",
            "safeBatchTransferFrom(address from, address to, uint256[] ids, uint256[] amounts, bytes data)",
        ],
        standard_events: &["TransferSingle", "TransferBatch", "ApprovalForAll", "URI"],
        typical_extensions: &["Mintable", "Burnable", "Supply tracking", "Pausable"],
    },
];

/// Canonical form of a template id: `erc20`, `ERC 20` and `erc-20` all become `ERC-20`
///
/// Returns None when the input is not `ERC` followed by digits.
pub fn normalize_template_id(id: &str) -> Option<String> {
    let compact: String = id
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect::<String>()
        .to_uppercase();

    let digits = compact.strip_prefix("ERC")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("ERC-{}", digits))
}

/// Ids of every standard in the catalog
pub fn known_ids() -> Vec<&'static str> {
    CATALOG.iter().map(|s| s.standard).collect()
}

/// Look up a standard by (loosely formatted) id
pub fn lookup_standard(id: &str) -> Result<&'static ErcStandard, String> {
    debug!(%id, "lookup_standard: called");
    let found = normalize_template_id(id).and_then(|canonical| CATALOG.iter().find(|s| s.standard == canonical));

    found.ok_or_else(|| {
        debug!(%id, "lookup_standard: unknown standard");
        format!(
            "Unknown standard '{}'. Available standards: {}. If the user wants something custom, use null for erc_template.",
            id,
            known_ids().join(", ")
        )
    })
}
