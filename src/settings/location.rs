use serde::{Deserialize, Serialize};

/// Region codes accepted by the `g` parameter of the hot listing.
const COUNTRIES: &[(&str, &str)] = &[
    ("GLOBAL", "Everywhere"),
    ("US", "United States"),
    ("AR", "Argentina"),
    ("AU", "Australia"),
    ("BG", "Bulgaria"),
    ("CA", "Canada"),
    ("CL", "Chile"),
    ("CO", "Colombia"),
    ("HR", "Croatia"),
    ("CZ", "Czechia"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("DE", "Germany"),
    ("GR", "Greece"),
    ("HU", "Hungary"),
    ("IS", "Iceland"),
    ("IN", "India"),
    ("IE", "Ireland"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("MY", "Malaysia"),
    ("MX", "Mexico"),
    ("NZ", "New Zealand"),
    ("PH", "Philippines"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("PR", "Puerto Rico"),
    ("RO", "Romania"),
    ("RS", "Serbia"),
    ("SG", "Singapore"),
    ("ES", "Spain"),
    ("SE", "Sweden"),
    ("TW", "Taiwan"),
    ("TH", "Thailand"),
    ("TR", "Türkiye"),
    ("GB", "United Kingdom"),
];

const US_STATES: &[&str] = &[
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL",
    "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE",
    "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VA", "VT", "WA", "WI", "WV", "WY",
];

/// Geographic scope for "hot" ranking, e.g. `GLOBAL`, `GB` or `US_TX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HotPostLocation(String);

impl HotPostLocation {
    pub fn global() -> Self {
        Self("GLOBAL".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable label, falling back to the code for US states
    pub fn label(&self) -> &str {
        COUNTRIES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, label)| *label)
            .unwrap_or(&self.0)
    }

    fn is_known(code: &str) -> bool {
        if COUNTRIES.iter().any(|(c, _)| *c == code) {
            return true;
        }
        code.strip_prefix("US_")
            .map(|state| US_STATES.contains(&state))
            .unwrap_or(false)
    }
}

impl Default for HotPostLocation {
    fn default() -> Self {
        Self::global()
    }
}

impl std::str::FromStr for HotPostLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        if Self::is_known(&code) {
            Ok(Self(code))
        } else {
            Err(format!("Unknown location: {}", s))
        }
    }
}

impl TryFrom<String> for HotPostLocation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HotPostLocation> for String {
    fn from(location: HotPostLocation) -> Self {
        location.0
    }
}

impl std::fmt::Display for HotPostLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
