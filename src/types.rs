use serde::Deserialize;

/// Result of an email disposability check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EmailCheckResult {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub is_disposable: bool,
}

/// Result of an IP reputation check.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct IpCheckResult {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub classification: IpClassification,
    /// Confidence in the classification, `0.0..=1.0`.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub signals: IpSignals,
    #[serde(default)]
    pub network: IpNetwork,
    #[serde(default)]
    pub geo: IpGeo,
}

/// Categorical verdict for an IP address.
///
/// Values the API introduces later decode as [`IpClassification::Unknown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpClassification {
    Hosting,
    Residential,
    Mobile,
    Vpn,
    Tor,
    Proxy,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Individual signals behind an IP classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IpSignals {
    #[serde(default)]
    pub is_hosting: bool,
    #[serde(default)]
    pub is_residential: bool,
    #[serde(default)]
    pub is_mobile: bool,
    #[serde(default)]
    pub is_vpn: bool,
    #[serde(default)]
    pub is_tor: bool,
    #[serde(default)]
    pub is_proxy: bool,
}

/// Network ownership details for an IP address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IpNetwork {
    pub asn: Option<u32>,
    pub org: Option<String>,
    pub provider: Option<String>,
}

/// Coarse geolocation for an IP address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IpGeo {
    pub country: Option<String>,
    pub region: Option<String>,
}
