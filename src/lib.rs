
pub mod config;
pub mod data;
pub mod error;
pub mod fptree;
pub mod hmine;
pub mod io;
pub mod miner;
pub mod patterns;

use tracing::*;

pub use config::{MiningConfig, Strategy};
pub use data::{Item, Count, Transaction, LabelTransaction, Encoder, FList, ItemIndex};
pub use error::{MineError, Result};
pub use fptree::Tree;
pub use hmine::{Hdb, HTable};
pub use miner::{Miner, HMiner, FpGrowthMiner, mine_labels, mine_shards};
pub use patterns::{FrequentItemset, PatternSet, decode_results};

/// Objects that can be recorded in the log
pub trait Loggable {
    fn log(&self, message: &str, level: tracing::Level );
}

/// Emits a message at a level only known at runtime
pub(crate) fn log_at( level: Level, message: &str ) {
    if level == Level::ERROR {
	error!( "{message}" );
    } else if level == Level::WARN {
	warn!( "{message}" );
    } else if level == Level::INFO {
	info!( "{message}" );
    } else if level == Level::DEBUG {
	debug!( "{message}" );
    } else {
	trace!( "{message}" );
    }
}
