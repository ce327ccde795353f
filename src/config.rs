
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Count;
use crate::data::compute_support;
use crate::error::{MineError, Result};
use crate::io::read_json;

/// Which miner enumerates the itemsets
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum )]
#[serde( rename_all = "lowercase" )]
pub enum Strategy {
    #[default]
    #[value( name = "hmine" )]
    HMine,
    #[value( name = "fpgrowth" )]
    FpGrowth,
}

/// Thresholds and limits of one mining run
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct MiningConfig {
    /// absolute number of transactions an itemset must occur in
    pub min_support: Count,
    /// if set, replaces `min_support` by this share of the batch, rounded down
    pub support_fraction: Option<f64>,
    /// longest itemset to report, -1 for no limit
    pub max_length: i64,
    /// number of itemsets kept for length 1, 2, ...
    pub top_k_per_length: Vec<usize>,
    pub strategy: Strategy,
}

impl Default for MiningConfig {
    fn default() -> Self {
	MiningConfig {
	    min_support: 1,
	    support_fraction: None,
	    max_length: -1,
	    top_k_per_length: vec!( 15000, 5000, 2000 ),
	    strategy: Strategy::HMine,
	}
    }
}

impl MiningConfig {

    /// Reads a JSON configuration, missing fields take their defaults
    pub fn load<P: AsRef<Path>>( path: P ) -> Result<MiningConfig> {
	let config: MiningConfig = read_json( path.as_ref() )?;
	config.validate()?;
	info!( "loaded configuration from {}", path.as_ref().display() );
	Ok( config )
    }

    pub fn validate( &self ) -> Result<()> {
	if self.max_length < -1 {
	    return Err( MineError::Config( format!( "max_length must be -1 or non-negative, got {}", self.max_length )));
	}
	if let Some( fraction ) = self.support_fraction {
	    if !( 0.0 ..= 1.0 ).contains( &fraction ) {
		return Err( MineError::Config( format!( "support_fraction must lie in [0, 1], got {}", fraction )));
	    }
	}
	Ok( () )
    }

    /// None if itemsets of any length are reported
    pub fn max_length( &self ) -> Option<usize> {
	usize::try_from( self.max_length ).ok()
    }

    /// Absolute support threshold for a batch of the given size
    pub fn min_support_for( &self, number_transactions: usize ) -> Count {
	match self.support_fraction {
	    Some( fraction ) => compute_support( fraction, number_transactions ),
	    None => self.min_support,
	}
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn defaults_match_quota() {
	let config = MiningConfig::default();
	assert_eq!( config.max_length(), None );
	assert_eq!( config.top_k_per_length, vec!( 15000, 5000, 2000 ));
	assert_eq!( config.min_support_for( 100 ), 1 );
	assert!( config.validate().is_ok() );
    }

    #[test]
    fn fraction_overrides_absolute_support() {
	let config = MiningConfig { support_fraction: Some( 0.3 ), min_support: 50, ..MiningConfig::default() };
	assert_eq!( config.min_support_for( 10 ), 3 );
    }

    #[test]
    fn invalid_values_are_rejected() {
	let config = MiningConfig { max_length: -2, ..MiningConfig::default() };
	assert!( matches!( config.validate(), Err( MineError::Config( _ ))));
	let config = MiningConfig { support_fraction: Some( 1.5 ), ..MiningConfig::default() };
	assert!( config.validate().is_err() );
    }

    #[test]
    fn partial_json_takes_defaults() {
	let config: MiningConfig = serde_json::from_str( r#"{ "max_length": 3, "strategy": "fpgrowth" }"# ).unwrap();
	assert_eq!( config.max_length(), Some( 3 ));
	assert_eq!( config.strategy, Strategy::FpGrowth );
	assert_eq!( config.min_support, 1 );
    }
}
