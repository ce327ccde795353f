
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info, info_span, Level};

use crate::{Item, Count, Transaction, LabelTransaction, Loggable};
use crate::config::{MiningConfig, Strategy};
use crate::data::{FList, encode_transactions};
use crate::error::Result;
use crate::fptree::Tree;
use crate::hmine::{Hdb, HTable};
use crate::patterns::{PatternSet, decode_results};

/// Enumerates every itemset whose support reaches the threshold
pub trait Miner {
    fn mine( &mut self, transactions: &[Transaction], min_support: Count ) -> Result<PatternSet>;
}

/// Depth-first miner over hyperlinked projections of one shared database
#[derive( Debug, Clone, Default )]
pub struct HMiner {
    max_length: Option<usize>,
    /// number of conditional tables descended into during the last run
    projections: u64,
}

/// Pattern growth over conditional prefix trees
#[derive( Debug, Clone, Default )]
pub struct FpGrowthMiner {
    max_length: Option<usize>,
    projections: u64,
}

/// One open level of the depth-first search
struct Frame<'db> {
    prefix: Vec<Item>,
    table: HTable<'db>,
    /// next header of `table` to extend the prefix with
    cursor: usize,
}

impl Miner for HMiner {
    fn mine( &mut self, transactions: &[Transaction], min_support: Count ) -> Result<PatternSet> {
	let _span = info_span!( "hmine", min_support ).entered();
	self.projections = 0;

	let flist = FList::build( transactions, min_support );
	let hdb = Hdb::from_flist( &flist, transactions );
	let mut table = HTable::init( &hdb, min_support, &flist )?;
	let mut result = PatternSet::new();

	let mut cursor = 0;
	while let Some( (position, item, support) ) = table.next_frequent( cursor, min_support ) {
	    cursor = position + 1;
	    result.insert( vec!( item ), support );
	    if !self.may_extend( 1 ) {
		continue;
	    }
	    table.derive_conditional_links( item, &flist, min_support )?;
	    if let Some( projection ) = table.take_conditional( item ) {
		self.projections += 1;
		self.mine_recursive( vec!( item ), projection, &flist, min_support, &mut result )?;
	    }
	}

	info!( "found {} itemsets in {} projections", result.len(), self.projections );
	result.log( "h-mine result", Level::DEBUG );
	Ok( result )
    }
}

impl HMiner {

    pub fn new( max_length: Option<usize> ) -> HMiner {
	HMiner { max_length, projections: 0 }
    }

    /// Emits `prefix + item` for every frequent item of `table` and descends into its projection.
    /// The search runs on an explicit stack, so deep projections cannot exhaust the call stack.
    pub fn mine_recursive<'db>( &mut self, prefix: Vec<Item>, table: HTable<'db>, flist: &FList, min_support: Count, result: &mut PatternSet ) -> Result<()> {
	let mut stack = vec!( Frame { prefix, table, cursor: 0 } );
	while let Some( frame ) = stack.last_mut() {
	    let Some( (position, item, support) ) = frame.table.next_frequent( frame.cursor, min_support ) else {
		stack.pop();
		continue;
	    };
	    frame.cursor = position + 1;

	    let mut itemset = frame.prefix.clone();
	    itemset.push( item );
	    result.insert( itemset.clone(), support );
	    if !self.may_extend( itemset.len() ) {
		continue;
	    }

	    frame.table.derive_conditional_links( item, flist, min_support )?;
	    if let Some( projection ) = frame.table.take_conditional( item ) {
		if projection.next_frequent( 0, min_support ).is_some() {
		    self.projections += 1;
		    stack.push( Frame { prefix: itemset, table: projection, cursor: 0 } );
		}
	    }
	}
	Ok( () )
    }

    fn may_extend( &self, length: usize ) -> bool {
	self.max_length.map_or( true, |max| length < max )
    }
}

impl Miner for FpGrowthMiner {
    fn mine( &mut self, transactions: &[Transaction], min_support: Count ) -> Result<PatternSet> {
	let _span = info_span!( "fpgrowth", min_support ).entered();
	let flist = FList::build( transactions, min_support );
	let tree = FpGrowthMiner::build_tree( &flist, transactions )?;
	self.mine_tree( &tree, flist.items(), min_support )
    }
}

impl FpGrowthMiner {

    pub fn new( max_length: Option<usize> ) -> FpGrowthMiner {
	FpGrowthMiner { max_length, projections: 0 }
    }

    /// Inserts every transaction in f-list order
    pub fn build_tree( flist: &FList, transactions: &[Transaction] ) -> Result<Tree> {
	let mut tree = Tree::new();
	for transaction in transactions {
	    tree.insert_ordered_transaction( &flist.reorder( transaction ))?;
	}
	tree.log( "initial tree", Level::DEBUG );
	Ok( tree )
    }

    /// Mines a tree whose paths follow `order`. Every item of the tree must appear in `order`.
    pub fn mine_tree( &mut self, tree: &Tree, order: &[Item], min_support: Count ) -> Result<PatternSet> {
	self.projections = 0;
	let rank: FxHashMap<Item, usize> = order.iter().enumerate().map( |(position, item)| (*item, position) ).collect();
	let mut result = PatternSet::new();
	self.grow( tree, &rank, &[], min_support, &mut result )?;
	info!( "found {} itemsets in {} conditional trees", result.len(), self.projections );
	Ok( result )
    }

    fn grow( &mut self, tree: &Tree, rank: &FxHashMap<Item, usize>, suffix: &[Item], min_support: Count, result: &mut PatternSet ) -> Result<()> {
	let rank_of = |item: &Item| rank.get( item ).copied().unwrap_or( usize::MAX );
	let mut items = tree.header_items().to_vec();
	// least frequent first
	items.sort_by_key( |item| std::cmp::Reverse( rank_of( item )));

	for item in items {
	    let support = tree.chain_support( item );
	    if support == 0 || support < min_support {
		continue;
	    }
	    let mut itemset = suffix.to_vec();
	    itemset.push( item );
	    let mut ordered = itemset.clone();
	    ordered.sort_by_key( rank_of );
	    result.insert( ordered, support );
	    if self.max_length.map_or( false, |max| itemset.len() >= max ) {
		continue;
	    }

	    let mut base = Vec::new();
	    for node in tree.chain( item ) {
		base.push( (tree.prefix_path( node )?, tree.node( node )?.count()) );
	    }
	    let conditional = conditional_tree( &base, min_support )?;
	    if conditional.node_count() > 0 {
		self.projections += 1;
		self.grow( &conditional, rank, &itemset, min_support, result )?;
	    }
	}
	Ok( () )
    }
}

/// Builds the tree of the prefix paths of one item, dropping items that are infrequent among them
fn conditional_tree( base: &[(Vec<Item>, Count)], min_support: Count ) -> Result<Tree> {
    let mut counts: FxHashMap<Item, Count> = FxHashMap::default();
    for (path, count) in base {
	for item in path {
	    *counts.entry( *item ).or_insert( 0 ) += count;
	}
    }

    let mut tree = Tree::new();
    for (path, count) in base {
	let kept: Vec<Item> = path.iter()
	    .filter( |item| counts[ *item ] >= min_support )
	    .copied()
	    .collect();
	if !kept.is_empty() {
	    tree.insert_weighted( &kept, *count )?;
	}
    }
    Ok( tree )
}

/// Encodes a labelled batch, mines it with the configured strategy and decodes the itemsets
pub fn mine_labels( transactions: &[LabelTransaction], config: &MiningConfig ) -> Result<PatternSet<String>> {
    config.validate()?;
    let (encoded, encoder) = encode_transactions( transactions );
    let min_support = config.min_support_for( encoded.len() );
    debug!( "mining {} transactions over {} labels at support {}", encoded.len(), encoder.len(), min_support );

    let raw = match config.strategy {
	Strategy::HMine => HMiner::new( config.max_length() ).mine( &encoded, min_support )?,
	Strategy::FpGrowth => FpGrowthMiner::new( config.max_length() ).mine( &encoded, min_support )?,
    };
    decode_results( &encoder, &raw, config.max_length(), &config.top_k_per_length )
}

/// Mines independent batches in parallel, one result per batch in input order
pub fn mine_shards( batches: &[Vec<LabelTransaction>], config: &MiningConfig ) -> Vec<Result<PatternSet<String>>> {
    batches.par_iter()
	.map( |batch| mine_labels( batch, config ))
	.collect()
}
