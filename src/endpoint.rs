//! Resolution of the API base URL for a network and chain.

use {
    crate::{canonical::parse_url, constants::*, SignatureError},
    http::uri::Uri,
    log::debug,
    std::env,
};

/// Return the deployment name of a chain, e.g. `mainnet` for chain id 1.
///
/// Only the `ethereum` network is supported.
pub fn chain_name(network: &str, chain_id: u64) -> Result<&'static str, SignatureError> {
    if network != ETHEREUM_NETWORK {
        return Err(SignatureError::UnsupportedChain(format!(
            "Only the '{}' network is supported; got '{}'",
            ETHEREUM_NETWORK, network
        )));
    }

    match chain_id {
        1 => Ok("mainnet"),
        3 => Ok("ropsten"),
        4 => Ok("rinkeby"),
        42 => Ok("kovan"),
        _ => Err(SignatureError::UnsupportedChain(format!("Unsupported chain id: {}", chain_id))),
    }
}

/// The base URL requests for one network and chain are sent to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiEndpoint {
    network: String,
    chain_id: u64,
    chain_name: &'static str,
    base_url: String,
}

impl ApiEndpoint {
    /// Resolve the default base URL, `https://{network}.{chain}.api.dexible.io/v1`.
    pub fn resolve(network: &str, chain_id: u64) -> Result<Self, SignatureError> {
        Self::resolve_with_override(network, chain_id, None)
    }

    /// Resolve the base URL, honoring the `API_BASE_URL` environment variable if it is set and
    /// non-empty.
    pub fn from_env(network: &str, chain_id: u64) -> Result<Self, SignatureError> {
        let base_override = env::var(ENV_API_BASE_URL).ok().filter(|s| !s.is_empty());
        Self::resolve_with_override(network, chain_id, base_override.as_deref())
    }

    /// Resolve the base URL, using `base_override` in place of the default if given. The network
    /// and chain id are validated either way.
    pub fn resolve_with_override(
        network: &str,
        chain_id: u64,
        base_override: Option<&str>,
    ) -> Result<Self, SignatureError> {
        let chain_name = chain_name(network, chain_id)?;
        let base_url = match base_override {
            Some(base) => {
                debug!("Using API base URL override {}", base);
                base.to_string()
            }
            None => format!("https://{}.{}.{}", network, chain_name, DEFAULT_BASE_ENDPOINT),
        };

        Ok(Self {
            network: network.to_string(),
            chain_id,
            chain_name,
            base_url,
        })
    }

    /// Retrieve the network name.
    #[inline(always)]
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Retrieve the chain id.
    #[inline(always)]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Retrieve the chain's deployment name.
    #[inline(always)]
    pub fn chain_name(&self) -> &'static str {
        self.chain_name
    }

    /// Retrieve the base URL.
    #[inline(always)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The URL of an API endpoint: `{base}/{endpoint}`.
    pub fn url(&self, endpoint: &str) -> Result<Uri, SignatureError> {
        parse_url(&format!("{}/{}", self.base_url, endpoint))
    }
}
