use crate::*;
use std::env::var;

/// Everything needed to set up an election
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ElectionConfig {
    pub candidates: Vec<String>,

    #[serde(default = "default_bit_strength")]
    pub bit_strength: usize,

    #[serde(default)]
    pub encoding: TallyEncoding,

    #[serde(default = "default_max_votes")]
    pub max_votes: u64,

    /// Use the RFC 3526 2048-bit group instead of generating a fresh safe prime
    #[serde(default = "default_fixed_group")]
    pub fixed_group: bool,
}

pub const DEFAULT_MAX_VOTES: u64 = 10_000;

fn default_bit_strength() -> usize {
    DEFAULT_BIT_STRENGTH
}

fn default_max_votes() -> u64 {
    DEFAULT_MAX_VOTES
}

fn default_fixed_group() -> bool {
    true
}

impl ElectionConfig {
    pub fn new(candidates: Vec<String>) -> Self {
        ElectionConfig {
            candidates,
            bit_strength: DEFAULT_BIT_STRENGTH,
            encoding: TallyEncoding::default(),
            max_votes: DEFAULT_MAX_VOTES,
            fixed_group: true,
        }
    }

    /// Read the configuration from `HOMOTALLY_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let candidates: Vec<String> = match lookup("HOMOTALLY_CANDIDATES") {
            Some(val) => val
                .split(',')
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty())
                .collect(),
            None => {
                return Err(Error::InvalidArgument(
                    "HOMOTALLY_CANDIDATES environment variable must be set".to_owned(),
                ))
            }
        };

        let bit_strength = match lookup("HOMOTALLY_BITS") {
            Some(val) => parse_var("HOMOTALLY_BITS", &val)?,
            None => DEFAULT_BIT_STRENGTH,
        };

        let encoding = match lookup("HOMOTALLY_ENCODING") {
            Some(val) => val.parse().map_err(|_| {
                Error::InvalidArgument(format!("HOMOTALLY_ENCODING: unknown encoding {:?}", val))
            })?,
            None => TallyEncoding::default(),
        };

        let max_votes = match lookup("HOMOTALLY_MAX_VOTES") {
            Some(val) => parse_var("HOMOTALLY_MAX_VOTES", &val)?,
            None => DEFAULT_MAX_VOTES,
        };

        let fixed_group = match lookup("HOMOTALLY_FIXED_GROUP") {
            Some(val) => parse_var("HOMOTALLY_FIXED_GROUP", &val)?,
            None => true,
        };

        let config = ElectionConfig {
            candidates,
            bit_strength,
            encoding,
            max_votes,
            fixed_group,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the settings make sense together
    pub fn validate(&self) -> Result<(), Error> {
        if self.candidates.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one candidate is required".to_owned(),
            ));
        }
        if self.max_votes == 0 {
            return Err(Error::InvalidArgument(
                "max_votes must be positive".to_owned(),
            ));
        }
        if !self.fixed_group && self.bit_strength < MIN_BIT_STRENGTH {
            return Err(Error::InvalidArgument(format!(
                "bit strength {} is below the minimum of {}",
                self.bit_strength, MIN_BIT_STRENGTH
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, val: &str) -> Result<T, Error> {
    val.trim()
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("{}: cannot parse {:?}", name, val)))
}
